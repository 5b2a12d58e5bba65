//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::document::{Document, Patch, Query};
use crate::error::{AuthError, StoreResult};
use crate::models::Principal;

/// Persistence contract: a schemaless, collection-of-documents store with
/// point reads, equality/order-by/limit queries, and optimistic
/// multi-document transactions.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Inserts a document under a caller-assigned id.
    async fn insert(&self, collection: &str, id: &str, doc: Document) -> StoreResult<()>;

    /// Applies `patch` to an existing document; `StoreError::Missing` when
    /// the target does not exist.
    async fn update(&self, collection: &str, id: &str, patch: Patch) -> StoreResult<()>;

    /// Removes a document. Deleting an absent document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    async fn query(&self, collection: &str, query: Query) -> StoreResult<Vec<(String, Document)>>;

    /// Opens an optimistic transaction. Reads through the returned handle
    /// record document versions; writes are buffered until `commit`, which
    /// fails with `StoreError::Conflict` if any read document has changed
    /// since it was read. The caller owns the retry loop.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTxn>>;
}

/// Handle for one optimistic transaction. Perform all reads before the
/// first buffered write; a committed handle must not be reused.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait StoreTxn: Send {
    /// Fresh read inside the transaction; joins the validated read set.
    async fn get(&mut self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    fn insert(&mut self, collection: &str, id: &str, doc: Document);

    fn update(&mut self, collection: &str, id: &str, patch: Patch);

    fn delete(&mut self, collection: &str, id: &str);

    /// Validates the read set and applies all buffered writes atomically.
    async fn commit(&mut self) -> StoreResult<()>;
}

/// Identity contract. Session lifecycle (sign-out, auth-state callbacks)
/// stays in the view layer; the core only consumes issued principals.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an account and issues its principal. Enforces email shape,
    /// uniqueness, and the 6-character password minimum.
    async fn register<'a>(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&'a str>,
    ) -> Result<Principal, AuthError>;

    /// Verifies credentials and issues the account's principal.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Principal, AuthError>;
}
