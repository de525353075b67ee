//! Backend selection.
//!
//! Request handlers share one store; [`StoreBuilder`] picks the backend and
//! opens it once at startup.

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::storage::file::FileStore;
use crate::storage::sqlite::SqliteStore;
use crate::storage::traits::DocumentStore;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Available store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// `SQLite` tables; schema must already exist.
    Sqlite,
    /// JSON-lines files, one per declared collection.
    File,
}

impl Provider {
    /// Returns all provider names.
    #[must_use]
    pub const fn names() -> &'static [&'static str] {
        &["sqlite", "file"]
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "file" | "nedb" => Ok(Self::File),
            other => Err(Error::config(format!(
                "unknown provider: {other} (expected one of: {})",
                Self::names().join(", ")
            ))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => f.write_str("sqlite"),
            Self::File => f.write_str("file"),
        }
    }
}

/// Builds a shared [`DocumentStore`].
///
/// # Examples
///
/// ```no_run
/// use yion_kit::storage::{Provider, StoreBuilder};
///
/// let store = StoreBuilder::new("shop")
///     .provider(Provider::File)
///     .collections(["users"])
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct StoreBuilder {
    provider: Option<Provider>,
    config: StoreConfig,
}

impl StoreBuilder {
    /// Starts a builder for the store `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            provider: None,
            config: StoreConfig::new(name),
        }
    }

    /// Starts a builder from an existing configuration.
    #[must_use]
    pub const fn from_config(config: StoreConfig) -> Self {
        Self {
            provider: None,
            config,
        }
    }

    /// Selects the backend.
    #[must_use]
    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Renames the store.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Sets the storage folder.
    #[must_use]
    pub fn folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.config = self.config.with_folder(folder);
        self
    }

    /// Sets the environment name.
    #[must_use]
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.config = self.config.with_environment(environment);
        self
    }

    /// Declares the collections the file backend may open.
    #[must_use]
    pub fn collections<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.with_collections(collections);
        self
    }

    /// Opens the selected backend.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no provider was selected, or the
    /// backend's error if it cannot be opened.
    pub fn build(self) -> Result<Arc<dyn DocumentStore>> {
        let provider = self
            .provider
            .ok_or_else(|| Error::config("no provider specified"))?;

        let store: Arc<dyn DocumentStore> = match provider {
            Provider::Sqlite => Arc::new(SqliteStore::open(&self.config)?),
            Provider::File => Arc::new(FileStore::open(self.config)?),
        };
        Ok(store)
    }
}
