use crate::error::LinkError;
use crate::generator::CodeGenerator;
use crate::validate::validate_url;
use snaplink_core::model::{LinkStats, ShortLink};
use snaplink_core::{LinkCache, LinkStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

/// Tunables for [`LinkService`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct LinkServiceSettings {
    /// Time-to-live for cache entries written after create/resolve.
    #[builder(default = Duration::from_secs(60 * 60))]
    pub cache_ttl: Duration,
    /// Attempt budget for the unique-code reservation loop.
    #[builder(default = 100)]
    pub max_generation_attempts: u32,
}

impl Default for LinkServiceSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The creation, resolution, and listing coordinators.
///
/// Owns every transaction lifecycle against the [`LinkStore`]: each
/// operation commits on success and rolls back exactly once on any
/// failure. The [`LinkCache`] is best-effort throughout; its failures
/// are logged and degrade to a store round-trip, never surfacing to
/// the caller.
pub struct LinkService<S, C, G> {
    store: Arc<S>,
    cache: Arc<C>,
    generator: Arc<G>,
    // Sole cross-request lock: serializes the generate-and-check loop
    // so two concurrent creations cannot claim the same candidate
    // between the existence check and the insert.
    reserve_lock: Arc<Mutex<()>>,
    settings: LinkServiceSettings,
}

impl<S, C, G> Clone for LinkService<S, C, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            generator: Arc::clone(&self.generator),
            reserve_lock: Arc::clone(&self.reserve_lock),
            settings: self.settings,
        }
    }
}

impl<S: LinkStore, C: LinkCache, G: CodeGenerator> LinkService<S, C, G> {
    /// Creates a service with default settings.
    pub fn new(store: S, cache: C, generator: G) -> Self {
        Self::with_settings(store, cache, generator, LinkServiceSettings::default())
    }

    /// Creates a service with explicit settings.
    pub fn with_settings(
        store: S,
        cache: C,
        generator: G,
        settings: LinkServiceSettings,
    ) -> Self {
        Self {
            store: Arc::new(store),
            cache: Arc::new(cache),
            generator: Arc::new(generator),
            reserve_lock: Arc::new(Mutex::new(())),
            settings,
        }
    }

    /// Shortens `original_url`, returning the created record with
    /// zeroed access fields.
    ///
    /// One read-write transaction covers find-or-insert of the
    /// original link, code reservation, and the short-link insert.
    /// After commit the cache is populated best-effort.
    pub async fn create(&self, original_url: &str) -> Result<LinkStats, LinkError> {
        validate_url(original_url)?;

        let mut tx = self.store.begin().await?;
        let short_link = match self.create_in_tx(&mut tx, original_url).await {
            Ok(short_link) => {
                self.store.commit(tx).await?;
                short_link
            }
            Err(e) => {
                self.rollback_logged(tx).await;
                return Err(e);
            }
        };

        if let Err(e) = self
            .cache
            .set(&short_link.code, original_url, self.settings.cache_ttl)
            .await
        {
            warn!(code = %short_link.code, error = %e, "failed to cache created short link");
        }

        info!(code = %short_link.code, "created short link");
        Ok(short_link.into_stats(original_url))
    }

    async fn create_in_tx(
        &self,
        tx: &mut S::Tx,
        original_url: &str,
    ) -> Result<ShortLink, LinkError> {
        let original = match self.store.find_original_link(tx, original_url).await? {
            Some(original) => original,
            None => self.store.insert_original_link(tx, original_url).await?,
        };

        let code = self.reserve_unique_code(tx).await?;

        Ok(self.store.insert_short_link(tx, &code, original.id).await?)
    }

    /// Generates candidates until one is unused, under the process-wide
    /// reservation lock. Exhausting the attempt budget fails with
    /// [`LinkError::TooManyAttempts`].
    async fn reserve_unique_code(&self, tx: &mut S::Tx) -> Result<String, LinkError> {
        let _guard = self.reserve_lock.lock().await;

        for _ in 0..self.settings.max_generation_attempts {
            let code = self.generator.generate();
            if self.store.find_short_link(tx, &code).await?.is_none() {
                return Ok(code);
            }
        }

        Err(LinkError::TooManyAttempts)
    }

    /// Resolves a short code to its original URL, recording the access.
    ///
    /// Cache-aside: a hit returns immediately and records the access in
    /// a spawned task; a miss (or any cache failure) goes through the
    /// store, bumping the counter atomically with the fetch, then
    /// repopulates the cache best-effort.
    pub async fn resolve(&self, code: &str) -> Result<String, LinkError> {
        if code.is_empty() {
            return Err(LinkError::BadRequest(
                "short code cannot be empty".to_string(),
            ));
        }

        match self.cache.get(code).await {
            Ok(Some(url)) => {
                debug!(code = %code, "resolved short link from cache");
                self.record_access(code);
                return Ok(url);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(code = %code, error = %e, "cache lookup failed, falling back to store");
            }
        }

        let mut tx = self.store.begin().await?;
        let url = match self.resolve_in_tx(&mut tx, code).await {
            Ok(url) => {
                self.store.commit(tx).await?;
                url
            }
            Err(e) => {
                self.rollback_logged(tx).await;
                return Err(e);
            }
        };

        if let Err(e) = self.cache.set(code, &url, self.settings.cache_ttl).await {
            warn!(code = %code, error = %e, "failed to repopulate cache");
        }

        debug!(code = %code, "resolved short link from store");
        Ok(url)
    }

    async fn resolve_in_tx(&self, tx: &mut S::Tx, code: &str) -> Result<String, LinkError> {
        if self.store.find_short_link(tx, code).await?.is_none() {
            return Err(LinkError::NotFound(code.to_string()));
        }

        // The row can still vanish under a concurrent sweep between
        // the check and the bump.
        self.store
            .resolve_and_bump_access(tx, code)
            .await?
            .ok_or_else(|| LinkError::NotFound(code.to_string()))
    }

    /// Records an access without blocking the caller. Failures are
    /// logged; the already-returned URL is unaffected.
    fn record_access(&self, code: &str) {
        let store = Arc::clone(&self.store);
        let code = code.to_string();

        tokio::spawn(async move {
            if let Err(e) = bump_access_once(store.as_ref(), &code).await {
                warn!(code = %code, error = %e, "failed to record short link access");
            }
        });
    }

    /// All short links joined with their originals, newest first.
    pub async fn list(&self) -> Result<Vec<LinkStats>, LinkError> {
        let mut tx = self.store.begin().await?;
        match self.store.list_all(&mut tx).await {
            Ok(stats) => {
                self.store.commit(tx).await?;
                Ok(stats)
            }
            Err(e) => {
                self.rollback_logged(tx).await;
                Err(e.into())
            }
        }
    }

    async fn rollback_logged(&self, tx: S::Tx) {
        if let Err(e) = self.store.rollback(tx).await {
            error!(error = %e, "failed to roll back transaction");
        }
    }
}

async fn bump_access_once<S: LinkStore>(store: &S, code: &str) -> Result<(), StoreError> {
    let mut tx = store.begin().await?;

    if let Err(e) = store.bump_access(&mut tx, code).await {
        if let Err(rb) = store.rollback(tx).await {
            warn!(code = %code, error = %rb, "failed to roll back access bump");
        }
        return Err(e);
    }

    store.commit(tx).await
}
