//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use crate::config::{
    DEFAULT_ENVIRONMENT, DEFAULT_FOLDER, DEFAULT_LOCALE, DEFAULT_TRANSLATION_FOLDER,
    ENVIRONMENT_VAR, LOCALE_VAR, StoreConfig, TRANSLATION_FOLDER_VAR,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// yion-kit: document storage and locale tooling for yion applications.
///
/// Reads and writes documents through the `SQLite` or embedded file backend,
/// and resolves translations the way the request pipeline does.
#[derive(Parser, Debug)]
#[command(name = "yion-kit")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Storage backend (sqlite, file).
    #[arg(short, long, env = "YION_PROVIDER", default_value = "sqlite", global = true)]
    pub provider: String,

    /// Store name; names the `SQLite` database file.
    #[arg(short, long, env = "YION_STORE_NAME", default_value = "app", global = true)]
    pub name: String,

    /// Folder holding the store files.
    #[arg(long, env = "YION_DATA_FOLDER", default_value = DEFAULT_FOLDER, global = true)]
    pub folder: PathBuf,

    /// Environment name used in file names.
    #[arg(long = "env", env = ENVIRONMENT_VAR, default_value = DEFAULT_ENVIRONMENT, global = true)]
    pub environment: String,

    /// Collections the file backend may open (comma-separated).
    #[arg(long, value_delimiter = ',', global = true)]
    pub collections: Vec<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Query selection shared by filtering commands.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Query document as JSON; each field becomes one predicate.
    #[arg(short, long, default_value = "{}")]
    pub query: String,

    /// Comparison operator (=, !=, <>, <, <=, >, >=, LIKE).
    #[arg(short, long, default_value = "=")]
    pub operator: String,

    /// Predicate connective (and, or).
    #[arg(short, long, default_value = "and")]
    pub logic: String,
}

/// Page selection shared by listing commands.
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Page number, starting at 1.
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Page size (defaults to 100 for find, 10 for paginate).
    #[arg(long)]
    pub limit: Option<u32>,

    /// Sort specification, e.g. `name:asc,createdAt:desc`.
    #[arg(short, long)]
    pub sort: Option<String>,
}

/// Translation sources shared by i18n commands.
#[derive(Args, Debug, Clone)]
pub struct I18nArgs {
    /// Folder holding `<base>.<locale>.json` files.
    #[arg(long, env = TRANSLATION_FOLDER_VAR, default_value = DEFAULT_TRANSLATION_FOLDER)]
    pub translations: PathBuf,

    /// Locale used when nothing else matches.
    #[arg(long, env = LOCALE_VAR, default_value = DEFAULT_LOCALE)]
    pub fallback: String,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a raw SQL statement (sqlite only).
    ///
    /// Intended for schema setup; the store never creates tables itself.
    Run {
        /// SQL statement text.
        sql: String,

        /// Positional parameters as JSON values.
        params: Vec<String>,
    },

    /// Insert a document; prints it with its generated id and timestamps.
    Insert {
        /// Table or collection name.
        table: String,

        /// Document as JSON.
        document: String,
    },

    /// Update documents matching an equality query.
    Update {
        /// Table or collection name.
        table: String,

        /// Query document as JSON.
        query: String,

        /// Fields to set, as JSON.
        patch: String,
    },

    /// Remove documents matching a query.
    #[command(alias = "rm")]
    Remove {
        /// Table or collection name.
        table: String,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Show the first document matching an equality query.
    FindOne {
        /// Table or collection name.
        table: String,

        /// Query document as JSON.
        #[arg(short, long, default_value = "{}")]
        query: String,
    },

    /// List one page of matching documents.
    Find {
        /// Table or collection name.
        table: String,

        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Count matching documents.
    Count {
        /// Table or collection name.
        table: String,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// List one page of matching documents with pagination metadata.
    Paginate {
        /// Table or collection name.
        table: String,

        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Translate a key.
    Translate {
        /// Dotted translation key.
        key: String,

        /// Target locale (defaults to the fallback).
        #[arg(long)]
        locale: Option<String>,

        /// Interpolation variables as `name=value`.
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,

        #[command(flatten)]
        i18n: I18nArgs,
    },

    /// Resolve the locale for a request.
    Locale {
        /// `Accept-Language` header value.
        #[arg(long)]
        accept_language: Option<String>,

        /// Request path, optionally with a query string.
        #[arg(long)]
        url: Option<String>,

        /// Explicit `lang` query parameter.
        #[arg(long)]
        lang: Option<String>,

        #[command(flatten)]
        i18n: I18nArgs,
    },
}

impl Cli {
    /// Builds the store configuration from the global flags.
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.name.clone())
            .with_folder(self.folder.clone())
            .with_environment(self.environment.clone())
            .with_collections(self.collections.iter().cloned())
    }
}
