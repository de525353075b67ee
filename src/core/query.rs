//! Query options, sorting, and pagination types shared by all stores.

use crate::core::document::{CREATED_AT_FIELD, Document, UPDATED_AT_FIELD};
use crate::error::Error;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Comparison operator applied to every query field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    #[default]
    Eq,
    /// `!=` (also accepts `<>`).
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `LIKE` with `%` and `_` wildcards.
    Like,
}

impl Operator {
    /// SQL spelling of the operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "LIKE",
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "=" | "==" => Ok(Self::Eq),
            "!=" | "<>" => Ok(Self::Ne),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            "LIKE" => Ok(Self::Like),
            other => Err(Error::config(format!("unknown operator: {other}"))),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Boolean connective joining the predicates of a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Logic {
    /// All predicates must hold.
    #[default]
    And,
    /// Any predicate may hold.
    Or,
}

impl Logic {
    /// SQL spelling of the connective.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl FromStr for Logic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            other => Err(Error::config(format!("unknown logic: {other}"))),
        }
    }
}

/// Per-call predicate options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Operator applied to every field.
    pub operator: Operator,
    /// Connective between fields.
    pub logic: Logic,
}

impl QueryOptions {
    /// Creates options with the given operator and connective.
    #[must_use]
    pub const fn new(operator: Operator, logic: Logic) -> Self {
        Self { operator, logic }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// SQL spelling of the direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" | "1" => Ok(Self::Asc),
            "DESC" | "-1" => Ok(Self::Desc),
            other => Err(Error::config(format!("unknown sort direction: {other}"))),
        }
    }
}

/// Ordered sort specification.
///
/// Fields are applied in insertion order. The default sorts by most recently
/// updated, then most recently created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort(Vec<(String, SortDirection)>);

impl Sort {
    /// Creates an empty sort (storage order).
    #[must_use]
    pub const fn none() -> Self {
        Self(Vec::new())
    }

    /// Creates a sort on a single field.
    #[must_use]
    pub fn by(field: impl Into<String>, direction: SortDirection) -> Self {
        Self(vec![(field.into(), direction)])
    }

    /// Adds a tie-breaking field.
    #[must_use]
    pub fn then(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.0.push((field.into(), direction));
        self
    }

    /// Iterates over `(field, direction)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, SortDirection)> {
        self.0.iter().map(|(f, d)| (f.as_str(), *d))
    }

    /// Returns true if no field is sorted on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::by(UPDATED_AT_FIELD, SortDirection::Desc).then(CREATED_AT_FIELD, SortDirection::Desc)
    }
}

impl FromStr for Sort {
    type Err = Error;

    /// Parses `field[:asc|desc],...`; a bare field sorts ascending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut sort = Self::none();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (field, direction) = match part.split_once(':') {
                Some((field, dir)) => (field.trim(), dir.parse()?),
                None => (part, SortDirection::Asc),
            };
            if field.is_empty() {
                return Err(Error::config(format!("empty sort field in: {s}")));
            }
            sort = sort.then(field, direction);
        }
        Ok(sort)
    }
}

/// A 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub page: u32,
    /// Maximum number of documents per page.
    pub limit: u32,
}

impl PageRequest {
    /// Default page size for `find`.
    pub const DEFAULT_FIND_LIMIT: u32 = 100;

    /// Default page size for `paginated`.
    pub const DEFAULT_PAGINATED_LIMIT: u32 = 10;

    /// Creates a page request.
    #[must_use]
    pub const fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Number of documents skipped before this page.
    ///
    /// Page 0 is treated as page 1.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.limit as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_FIND_LIMIT)
    }
}

/// Pagination metadata returned with a page of documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Requested page number.
    pub page: u32,
    /// Requested page size.
    pub limit: u32,
    /// Total number of matching documents.
    pub total: u64,
}

/// A page of documents plus pagination metadata.
///
/// `data` and `total` come from two separate reads, so a concurrent write
/// between them can make `total` disagree with the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated {
    /// Documents on this page.
    pub data: Vec<Document>,
    /// Page metadata.
    pub pagination: Pagination,
}
