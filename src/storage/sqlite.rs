//! `SQLite` document store.
//!
//! Maps documents onto rows of pre-existing tables. One connection is held
//! per store; every call moves a single statement onto the blocking pool and
//! waits for it. The schema is the caller's business.

// SQLite counts are i64; COUNT(*) is never negative.
#![allow(clippy::cast_sign_loss)]

use crate::config::StoreConfig;
use crate::core::{
    Document, PageRequest, QueryOptions, Sort, Value, now_millis, stamp_insert, stamp_update,
};
use crate::error::{Result, StorageError};
use crate::storage::codec::{normalize, row_to_document};
use crate::storage::statement::{self, Statement};
use crate::storage::traits::DocumentStore;
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params_from_iter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// SQLite-backed document store.
///
/// # Examples
///
/// ```no_run
/// use yion_kit::config::StoreConfig;
/// use yion_kit::storage::{DocumentStore, SqliteStore};
///
/// # async fn demo() -> yion_kit::Result<()> {
/// let store = SqliteStore::open(&StoreConfig::new("shop"))?;
/// let doc = yion_kit::core::document([("name", "a")]);
/// let stored = store.insert("items", doc).await?;
/// assert!(stored.contains_key("id"));
/// # Ok(())
/// # }
/// ```
pub struct SqliteStore {
    /// Connection, `None` once closed.
    conn: Arc<Mutex<Option<Connection>>>,
    /// Logical store name.
    name: String,
    /// Path to the database file (None for in-memory).
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens or creates `{folder}/{name}_{environment}.db`.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be created or the database
    /// cannot be opened.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        Self::open_path(&config.name, config.database_path())
    }

    /// Opens or creates a database at an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent folder cannot be created or the
    /// database cannot be opened.
    pub fn open_path<P: AsRef<Path>>(name: &str, path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Io {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(&path).map_err(StorageError::from)?;

        // journal_mode returns the resulting mode as a row
        let _: String = conn
            .query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))
            .map_err(StorageError::from)?;

        info!(store = name, path = %path.display(), "database connected");

        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            name: name.to_string(),
            path: Some(path),
        })
    }

    /// Creates an in-memory database.
    ///
    /// Useful for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        debug!("opened in-memory database");

        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            name: "memory".to_string(),
            path: None,
        })
    }

    /// Returns the logical store name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Executes a raw statement with document values as parameters.
    ///
    /// Parameters are normalized like any other stored value. Intended for
    /// schema setup, which the store itself never performs.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the statement or the store is
    /// closed.
    pub async fn run(&self, sql: &str, params: &[Value]) -> Result<usize> {
        self.execute(Statement {
            sql: sql.to_string(),
            params: params.iter().map(normalize).collect(),
        })
        .await
    }

    /// Runs `f` against the open connection on the blocking pool.
    async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let result = tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| StorageError::Task(format!("connection mutex poisoned: {e}")))?;
            let conn = guard.as_ref().ok_or(StorageError::Closed)?;
            f(conn).map_err(StorageError::from)
        })
        .await
        .map_err(StorageError::from)?;

        Ok(result?)
    }

    /// Executes a statement that returns no rows.
    async fn execute(&self, stmt: Statement) -> Result<usize> {
        debug!(sql = %stmt.sql, params = stmt.params.len(), "executing statement");
        self.with_connection(move |conn| conn.execute(&stmt.sql, params_from_iter(stmt.params.iter())))
            .await
    }

    /// Executes a query and denormalizes every returned row.
    async fn query(&self, stmt: Statement) -> Result<Vec<Document>> {
        debug!(sql = %stmt.sql, params = stmt.params.len(), "executing query");
        self.with_connection(move |conn| {
            let mut prepared = conn.prepare(&stmt.sql)?;
            prepared
                .query_map(params_from_iter(stmt.params.iter()), row_to_document)?
                .collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert(&self, table: &str, mut document: Document) -> Result<Document> {
        stamp_insert(&mut document, now_millis());
        self.execute(statement::insert(table, &document)).await?;
        Ok(document)
    }

    async fn update(&self, table: &str, query: &Document, mut patch: Document) -> Result<()> {
        if query.is_empty() {
            return Err(StorageError::EmptyPredicate { operation: "update" }.into());
        }

        stamp_update(&mut patch, now_millis());
        self.execute(statement::update(table, query, &patch)).await?;
        Ok(())
    }

    async fn remove(&self, table: &str, query: &Document, options: QueryOptions) -> Result<()> {
        if query.is_empty() {
            return Err(StorageError::EmptyPredicate { operation: "remove" }.into());
        }

        self.execute(statement::delete(table, query, options)).await?;
        Ok(())
    }

    async fn find_one(&self, table: &str, query: &Document) -> Result<Option<Document>> {
        let stmt = statement::select_one(table, query);
        debug!(sql = %stmt.sql, params = stmt.params.len(), "executing query");
        self.with_connection(move |conn| {
            conn.query_row(&stmt.sql, params_from_iter(stmt.params.iter()), row_to_document)
                .optional()
        })
        .await
    }

    async fn find(
        &self,
        table: &str,
        query: &Document,
        page: PageRequest,
        sort: &Sort,
        options: QueryOptions,
    ) -> Result<Vec<Document>> {
        self.query(statement::select_page(table, query, page, sort, options))
            .await
    }

    async fn count(&self, table: &str, query: &Document, options: QueryOptions) -> Result<u64> {
        let stmt = statement::count(table, query, options);
        debug!(sql = %stmt.sql, params = stmt.params.len(), "executing query");
        let count: i64 = self
            .with_connection(move |conn| {
                conn.query_row(&stmt.sql, params_from_iter(stmt.params.iter()), |row| {
                    row.get(0)
                })
            })
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn close(&self) -> Result<()> {
        let conn = Arc::clone(&self.conn);
        let name = self.name.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|e| StorageError::Task(format!("connection mutex poisoned: {e}")))?;
            let connection = guard.take().ok_or(StorageError::Closed)?;
            if let Err((connection, err)) = connection.close() {
                // keep the handle so a retry can release it
                *guard = Some(connection);
                return Err(StorageError::from(err));
            }
            info!(store = %name, "database closed");
            Ok(())
        })
        .await
        .map_err(StorageError::from)??;
        Ok(())
    }
}
