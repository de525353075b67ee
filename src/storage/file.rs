//! Embedded document store backed by JSON-lines files.
//!
//! Each collection is one `{name}_{environment}.db` file holding one JSON
//! document per line. Collections must be declared up front; a collection is
//! opened on first use and its handle kept until the store is closed.
//!
//! Instants are written as `{"$$date": <epoch millis>}` so they survive a
//! reload. When reading, a later line with the same `id` replaces an earlier
//! one and `{"$$deleted": true, "id": ...}` removes it, so files appended to
//! by other tooling load correctly.

use crate::config::StoreConfig;
use crate::core::{
    Document, ID_FIELD, PageRequest, QueryOptions, Sort, Value, now_millis, stamp_insert,
    stamp_update,
};
use crate::error::{Result, StorageError};
use crate::storage::matcher::{matches, sort_documents};
use crate::storage::traits::DocumentStore;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const DATE_KEY: &str = "$$date";
const DELETED_KEY: &str = "$$deleted";

/// An opened collection: its file and its documents in insertion order.
#[derive(Debug)]
struct Collection {
    path: PathBuf,
    documents: Vec<Document>,
}

impl Collection {
    async fn load(path: PathBuf) -> Result<Self> {
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(io_error(&path, &e).into()),
        };

        // Slots keep positions stable while later lines replace or delete
        // earlier ones; ids are keyed by their JSON text.
        let mut slots: Vec<Option<Document>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let json: serde_json::Value = match serde_json::from_str(line) {
                Ok(json) => json,
                Err(e) => {
                    warn!(path = %path.display(), line = line_no + 1, error = %e, "skipping corrupt line");
                    continue;
                }
            };
            let deleted = json.get(DELETED_KEY).and_then(serde_json::Value::as_bool) == Some(true);
            let id = json.get(ID_FIELD).map(ToString::to_string);
            let Value::Map(document) = decode_value(json) else {
                warn!(path = %path.display(), line = line_no + 1, "skipping non-object line");
                continue;
            };

            match (deleted, id) {
                (true, Some(id)) => {
                    if let Some(slot) = index.remove(&id) {
                        slots[slot] = None;
                    }
                }
                (true, None) => {}
                (false, Some(id)) => match index.get(&id) {
                    Some(&slot) => slots[slot] = Some(document),
                    None => {
                        index.insert(id, slots.len());
                        slots.push(Some(document));
                    }
                },
                (false, None) => slots.push(Some(document)),
            }
        }

        let documents: Vec<Document> = slots.into_iter().flatten().collect();
        debug!(path = %path.display(), documents = documents.len(), "collection loaded");
        Ok(Self { path, documents })
    }
}

/// Rewrites the whole collection file through a temporary sibling.
async fn persist(path: &Path, documents: &[Document]) -> Result<()> {
    let mut text = String::new();
    for document in documents {
        let line = serde_json::to_string(&encode_document(document)).map_err(StorageError::from)?;
        text.push_str(&line);
        text.push('\n');
    }

    let tmp = path.with_extension("db~");
    tokio::fs::write(&tmp, text)
        .await
        .map_err(|e| io_error(&tmp, &e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| io_error(path, &e))?;
    Ok(())
}

fn io_error(path: &Path, err: &std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Encodes a value for the collection file.
fn encode_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Instant(dt) => {
            let mut map = serde_json::Map::new();
            map.insert(DATE_KEY.to_string(), dt.timestamp_millis().into());
            serde_json::Value::Object(map)
        }
        Value::List(items) => serde_json::Value::Array(items.iter().map(encode_value).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect(),
        ),
        other => other.to_json(),
    }
}

fn encode_document(document: &Document) -> serde_json::Value {
    serde_json::Value::Object(
        document
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

/// Decodes a value read from a collection file.
fn decode_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Object(map) => {
            if map.len() == 1
                && let Some(millis) = map.get(DATE_KEY).and_then(serde_json::Value::as_i64)
                && let Some(dt) = Utc.timestamp_millis_opt(millis).single()
            {
                return Value::Instant(dt);
            }
            Value::Map(
                map.into_iter()
                    .filter(|(k, _)| k != DELETED_KEY)
                    .map(|(k, v)| (k, decode_value(v)))
                    .collect(),
            )
        }
        serde_json::Value::Array(items) => {
            Value::List(items.into_iter().map(decode_value).collect())
        }
        other => Value::from(other),
    }
}

/// Document store over per-collection JSON-lines files.
///
/// # Examples
///
/// ```no_run
/// use yion_kit::config::StoreConfig;
/// use yion_kit::storage::{DocumentStore, FileStore};
///
/// # async fn demo() -> yion_kit::Result<()> {
/// let config = StoreConfig::new("shop").with_collections(["users"]);
/// let store = FileStore::open(config)?;
/// store.insert("users", yion_kit::core::document([("name", "ana")])).await?;
/// # Ok(())
/// # }
/// ```
pub struct FileStore {
    config: StoreConfig,
    /// Opened collections; `None` once the store is closed.
    collections: Mutex<Option<HashMap<String, Collection>>>,
}

impl FileStore {
    /// Creates a store over `config.folder`, creating the folder if needed.
    ///
    /// Collection files are not touched until first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be created.
    pub fn open(config: StoreConfig) -> Result<Self> {
        if !config.folder.as_os_str().is_empty() && !config.folder.exists() {
            std::fs::create_dir_all(&config.folder).map_err(|e| io_error(&config.folder, &e))?;
        }

        info!(
            folder = %config.folder.display(),
            collections = config.collections.len(),
            "document store ready"
        );

        Ok(Self {
            config,
            collections: Mutex::new(Some(HashMap::new())),
        })
    }

    /// Returns a collection, loading it on first use.
    async fn collection<'a>(
        &self,
        opened: &'a mut HashMap<String, Collection>,
        name: &str,
    ) -> Result<&'a mut Collection> {
        if !self.config.collections.iter().any(|c| c == name) {
            return Err(StorageError::UnknownCollection {
                name: name.to_string(),
            }
            .into());
        }

        if !opened.contains_key(name) {
            let collection = Collection::load(self.config.file_path(name)).await?;
            opened.insert(name.to_string(), collection);
        }

        opened.get_mut(name).ok_or_else(|| {
            StorageError::UnknownCollection {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Runs a read against a collection.
    async fn with_collection<F, T>(&self, name: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Collection) -> T + Send,
        T: Send,
    {
        let mut guard = self.collections.lock().await;
        let opened = guard.as_mut().ok_or(StorageError::Closed)?;
        let collection = self.collection(opened, name).await?;
        Ok(f(collection))
    }

    /// Runs a write against a copy of a collection. The copy replaces the
    /// cached documents only once it is on disk; `f` reports whether it
    /// changed anything.
    async fn mutate<F, T>(&self, name: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Document>) -> (T, bool) + Send,
        T: Send,
    {
        let mut guard = self.collections.lock().await;
        let opened = guard.as_mut().ok_or(StorageError::Closed)?;
        let collection = self.collection(opened, name).await?;

        let mut documents = collection.documents.clone();
        let (result, changed) = f(&mut documents);
        if changed {
            persist(&collection.path, &documents).await?;
            collection.documents = documents;
        }
        Ok(result)
    }

    fn filtered(collection: &Collection, query: &Document, options: QueryOptions) -> Vec<Document> {
        collection
            .documents
            .iter()
            .filter(|d| matches(d, query, options))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn insert(&self, table: &str, mut document: Document) -> Result<Document> {
        stamp_insert(&mut document, now_millis());
        let stored = document.clone();
        self.mutate(table, move |documents| {
            documents.push(document);
            ((), true)
        })
        .await?;
        Ok(stored)
    }

    async fn update(&self, table: &str, query: &Document, mut patch: Document) -> Result<()> {
        if query.is_empty() {
            return Err(StorageError::EmptyPredicate { operation: "update" }.into());
        }

        stamp_update(&mut patch, now_millis());
        let updated = self
            .mutate(table, |documents| {
                let mut updated = 0usize;
                for document in documents.iter_mut() {
                    if matches(document, query, QueryOptions::default()) {
                        document.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
                        updated += 1;
                    }
                }
                (updated, updated > 0)
            })
            .await?;

        debug!(collection = table, updated, "update applied");
        Ok(())
    }

    async fn remove(&self, table: &str, query: &Document, options: QueryOptions) -> Result<()> {
        if query.is_empty() {
            return Err(StorageError::EmptyPredicate { operation: "remove" }.into());
        }

        let removed = self
            .mutate(table, |documents| {
                let before = documents.len();
                documents.retain(|d| !matches(d, query, options));
                let removed = before - documents.len();
                (removed, removed > 0)
            })
            .await?;

        debug!(collection = table, removed, "remove applied");
        Ok(())
    }

    async fn find_one(&self, table: &str, query: &Document) -> Result<Option<Document>> {
        self.with_collection(table, |collection| {
            collection
                .documents
                .iter()
                .find(|d| matches(d, query, QueryOptions::default()))
                .cloned()
        })
        .await
    }

    #[allow(clippy::cast_possible_truncation)]
    async fn find(
        &self,
        table: &str,
        query: &Document,
        page: PageRequest,
        sort: &Sort,
        options: QueryOptions,
    ) -> Result<Vec<Document>> {
        self.with_collection(table, |collection| {
            let mut documents = Self::filtered(collection, query, options);
            sort_documents(&mut documents, sort);
            documents
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit as usize)
                .collect()
        })
        .await
    }

    async fn count(&self, table: &str, query: &Document, options: QueryOptions) -> Result<u64> {
        self.with_collection(table, |collection| {
            collection
                .documents
                .iter()
                .filter(|d| matches(d, query, options))
                .count() as u64
        })
        .await
    }

    async fn close(&self) -> Result<()> {
        let mut guard = self.collections.lock().await;
        let opened = guard.take().ok_or(StorageError::Closed)?;
        info!(collections = opened.len(), "document store closed");
        Ok(())
    }
}
