use crate::error::StoreResult;
use crate::model::{LinkStats, OriginalLink, ShortLink};
use async_trait::async_trait;
use jiff::Timestamp;

/// Durable, transactional storage for original URLs and short links.
///
/// The engine owns every transaction lifecycle: it obtains a handle
/// with [`begin`](LinkStore::begin), threads it through the statement
/// methods, and finishes it with exactly one
/// [`commit`](LinkStore::commit) or [`rollback`](LinkStore::rollback).
/// Implementations must make a dropped, unfinished handle equivalent
/// to a rollback so no failure path can leak partial writes.
#[async_trait]
pub trait LinkStore: Send + Sync + 'static {
    /// An open read-write transaction at read-committed isolation.
    type Tx: Send;

    async fn begin(&self) -> StoreResult<Self::Tx>;

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()>;

    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()>;

    /// Looks up an original link by exact URL value.
    async fn find_original_link(
        &self,
        tx: &mut Self::Tx,
        url: &str,
    ) -> StoreResult<Option<OriginalLink>>;

    /// Inserts an original link, converging with any concurrent insert
    /// of the same URL (upsert-on-conflict). Returns the surviving row.
    async fn insert_original_link(&self, tx: &mut Self::Tx, url: &str)
        -> StoreResult<OriginalLink>;

    /// Looks up a short link by code.
    async fn find_short_link(&self, tx: &mut Self::Tx, code: &str)
        -> StoreResult<Option<ShortLink>>;

    /// Inserts a short link row referencing an original link and
    /// returns it with its store-assigned id and creation time.
    async fn insert_short_link(
        &self,
        tx: &mut Self::Tx,
        code: &str,
        original_link_id: i64,
    ) -> StoreResult<ShortLink>;

    /// Atomically increments the access counter, stamps the access
    /// time, and returns the joined original URL. `None` when the code
    /// has no live row.
    async fn resolve_and_bump_access(
        &self,
        tx: &mut Self::Tx,
        code: &str,
    ) -> StoreResult<Option<String>>;

    /// Increments the access counter and stamps the access time
    /// without fetching the URL. A missing code is not an error.
    async fn bump_access(&self, tx: &mut Self::Tx, code: &str) -> StoreResult<()>;

    /// All short links joined with their originals, newest first.
    async fn list_all(&self, tx: &mut Self::Tx) -> StoreResult<Vec<LinkStats>>;

    /// Codes whose last access is strictly older than `older_than`,
    /// capped at `limit`. Never-accessed links are not returned.
    async fn find_expired(
        &self,
        tx: &mut Self::Tx,
        older_than: Timestamp,
        limit: usize,
    ) -> StoreResult<Vec<String>>;

    /// Deletes the short links with the given codes.
    async fn delete_short_links(&self, tx: &mut Self::Tx, codes: &[String]) -> StoreResult<()>;

    /// Deletes original links no longer referenced by any short link.
    /// Returns the number of rows removed.
    async fn delete_orphaned_original_links(&self, tx: &mut Self::Tx) -> StoreResult<u64>;
}
