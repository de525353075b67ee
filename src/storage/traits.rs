//! Document store trait definition.
//!
//! Defines the interface shared by every backend, so request handlers can hold
//! an `Arc<dyn DocumentStore>` without caring which engine sits behind it.

use crate::core::{Document, PageRequest, Paginated, Pagination, QueryOptions, Sort};
use crate::error::Result;
use async_trait::async_trait;

/// Trait for document store backends.
///
/// Every call is a single request/response round trip. Matching zero
/// documents in `update` or `remove` is a success.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a document.
    ///
    /// Assigns a fresh `id` and stamps `createdAt`/`updatedAt` with the same
    /// instant. Returns the stored document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    async fn insert(&self, table: &str, document: Document) -> Result<Document>;

    /// Applies `patch` to every document matching `query` (equality, AND).
    ///
    /// Refreshes `updatedAt`; `id` and `createdAt` are never modified.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is empty or the backend rejects the write.
    async fn update(&self, table: &str, query: &Document, patch: Document) -> Result<()>;

    /// Removes every document matching `query` under `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is empty or the backend rejects the write.
    async fn remove(&self, table: &str, query: &Document, options: QueryOptions) -> Result<()>;

    /// Finds the first document matching `query` (equality, AND).
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn find_one(&self, table: &str, query: &Document) -> Result<Option<Document>>;

    /// Finds one page of documents matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn find(
        &self,
        table: &str,
        query: &Document,
        page: PageRequest,
        sort: &Sort,
        options: QueryOptions,
    ) -> Result<Vec<Document>>;

    /// Counts documents matching `query`, ignoring pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn count(&self, table: &str, query: &Document, options: QueryOptions) -> Result<u64>;

    /// Finds a page of documents together with the total match count.
    ///
    /// The page and the count are two independent reads and are not atomic
    /// as a pair.
    ///
    /// # Errors
    ///
    /// Returns an error if either read fails.
    async fn paginated(
        &self,
        table: &str,
        query: &Document,
        page: PageRequest,
        sort: &Sort,
        options: QueryOptions,
    ) -> Result<Paginated> {
        let data = self.find(table, query, page, sort, options).await?;
        let total = self.count(table, query, options).await?;

        Ok(Paginated {
            data,
            pagination: Pagination {
                page: page.page,
                limit: page.limit,
                total,
            },
        })
    }

    /// Releases the backend's resources.
    ///
    /// Any later call, including a second `close`, fails with
    /// [`StorageError::Closed`](crate::error::StorageError::Closed).
    ///
    /// # Errors
    ///
    /// Returns an error if the store is already closed or release fails.
    async fn close(&self) -> Result<()>;
}
