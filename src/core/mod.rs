//! Core domain models for yion-kit.
//!
//! Documents, their values, and the query/sort/page types every store
//! accepts. These are pure domain models with no I/O dependencies.

pub mod document;
pub mod query;
pub mod value;

pub use document::{
    CREATED_AT_FIELD, Document, ID_FIELD, UPDATED_AT_FIELD, document, parse_document, stamp_insert,
    stamp_update,
};
pub use query::{
    Logic, Operator, PageRequest, Paginated, Pagination, QueryOptions, Sort, SortDirection,
};
pub use value::{Value, format_instant, now_millis};
