//! Storage layer for yion-kit.
//!
//! Provides the [`DocumentStore`] trait and its two backends: a `SQLite`
//! adapter mapping documents onto rows of existing tables, and an embedded
//! JSON-lines store with one file per collection.

pub mod codec;
pub mod file;
pub mod matcher;
pub mod provider;
pub mod sqlite;
pub mod statement;
pub mod traits;

pub use file::FileStore;
pub use provider::{Provider, StoreBuilder};
pub use sqlite::SqliteStore;
pub use traits::DocumentStore;
