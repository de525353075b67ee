//! # yion-kit
//!
//! Storage and internationalization plumbing for yion web applications.
//!
//! ## Features
//!
//! - **Document stores**: one async [`DocumentStore`] API over `SQLite` tables
//!   or embedded JSON-lines collections
//! - **Value coercion**: booleans, instants and nested structures survive a
//!   trip through `SQLite`'s scalar column types
//! - **Translations**: per-locale JSON catalogues with dotted keys,
//!   `{{var}}` interpolation and a fallback chain
//! - **Locale resolution**: `Accept-Language`, URL segment and `lang` query
//!   parameter, in that order of precedence

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod i18n;
pub mod storage;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export configuration
pub use config::{I18nConfig, StoreConfig};

// Re-export core domain types
pub use core::{
    Document, Logic, Operator, PageRequest, Paginated, Pagination, QueryOptions, Sort,
    SortDirection, Value,
};

// Re-export storage types
pub use storage::{DocumentStore, FileStore, Provider, SqliteStore, StoreBuilder};

// Re-export i18n types
pub use i18n::{Catalog, I18n, LocaleRequest, LocaleResolver, TranslateOptions, Translator};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};
