//! Configuration for stores and translations.
//!
//! Values default from the process environment the same way the CLI flags do,
//! so library users and the binary agree on where files live.

use std::path::PathBuf;

/// Default folder holding database and collection files.
pub const DEFAULT_FOLDER: &str = "data";

/// Environment used when `APP_ENV` is unset.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Environment variable naming the current environment.
pub const ENVIRONMENT_VAR: &str = "APP_ENV";

/// Default folder holding translation files.
pub const DEFAULT_TRANSLATION_FOLDER: &str = "translations";

/// Environment variable overriding the translation folder.
pub const TRANSLATION_FOLDER_VAR: &str = "TRANSLATION_FOLDER";

/// Default fallback locale.
pub const DEFAULT_LOCALE: &str = "en";

/// Environment variable overriding the fallback locale.
pub const LOCALE_VAR: &str = "LOCALE";

/// Extension of every on-disk store file.
pub const STORE_FILE_EXTENSION: &str = "db";

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Logical store name; names the relational database file.
    pub name: String,
    /// Folder holding the store files.
    pub folder: PathBuf,
    /// Environment name, used to namespace files per environment.
    pub environment: String,
    /// Collections the document backend is allowed to open.
    pub collections: Vec<String>,
}

impl StoreConfig {
    /// Creates a configuration for `name` with defaults taken from the
    /// environment.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folder: PathBuf::from(DEFAULT_FOLDER),
            environment: std::env::var(ENVIRONMENT_VAR)
                .unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string()),
            collections: Vec::new(),
        }
    }

    /// Sets the storage folder.
    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Sets the environment name.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Sets the allowed collections.
    #[must_use]
    pub fn with_collections<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collections = collections.into_iter().map(Into::into).collect();
        self
    }

    /// Path of the file backing `name`: `{folder}/{name}_{environment}.db`.
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.folder.join(format!(
            "{name}_{}.{STORE_FILE_EXTENSION}",
            self.environment
        ))
    }

    /// Path of the relational database file.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.file_path(&self.name)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("app")
    }
}

/// Translation configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I18nConfig {
    /// Folder holding `<base>.<locale>.json` files.
    pub folder: PathBuf,
    /// Locale used when nothing else matches.
    pub fallback: String,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from(DEFAULT_TRANSLATION_FOLDER),
            fallback: DEFAULT_LOCALE.to_string(),
        }
    }
}
