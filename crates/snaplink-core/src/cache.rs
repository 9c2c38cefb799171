use crate::error::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// A read-through accelerator mapping short codes to original URLs.
///
/// The cache is never authoritative: the store is the source of truth
/// and only URLs confirmed to exist there are written here. Callers
/// must treat any failure as a miss and fall back to the store.
#[async_trait]
pub trait LinkCache: Send + Sync + 'static {
    /// Fetches the cached URL for a code. `Ok(None)` on a miss.
    async fn get(&self, code: &str) -> CacheResult<Option<String>>;

    /// Stores `code -> url` with the given time-to-live.
    async fn set(&self, code: &str, url: &str, ttl: Duration) -> CacheResult<()>;
}
