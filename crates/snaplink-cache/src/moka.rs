use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use snaplink_core::error::CacheResult;
use snaplink_core::LinkCache;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Expires each entry after the TTL it was inserted with.
struct PerEntryTtl;

impl Expiry<String, (String, Duration)> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &(String, Duration),
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.1)
    }
}

/// An in-memory [`LinkCache`] backed by Moka.
///
/// Useful for single-node deployments without Redis, and as the cache
/// collaborator in tests.
#[derive(Debug, Clone)]
pub struct MokaLinkCache {
    cache: Cache<String, (String, Duration)>,
}

impl MokaLinkCache {
    /// Creates a cache with a default capacity of 10,000 entries.
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    /// Creates a cache holding at most `max_capacity` entries.
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }
}

impl Default for MokaLinkCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkCache for MokaLinkCache {
    async fn get(&self, code: &str) -> CacheResult<Option<String>> {
        trace!(code = %code, "fetching URL from Moka cache");
        Ok(self.cache.get(code).await.map(|(url, _)| url))
    }

    async fn set(&self, code: &str, url: &str, ttl: Duration) -> CacheResult<()> {
        debug!(code = %code, ttl_secs = ttl.as_secs(), "caching URL in Moka");
        self.cache
            .insert(code.to_string(), (url.to_string(), ttl))
            .await;
        Ok(())
    }
}
