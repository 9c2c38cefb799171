//! Periodic reclamation of stale short links.
//!
//! The sweeper shares only the [`LinkStore`] with the serving path: on
//! every tick it deletes a bounded batch of short links whose last
//! access is older than the retention window, then removes original
//! links left without references.

use jiff::{SignedDuration, Timestamp};
use snaplink_core::{LinkStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};
use typed_builder::TypedBuilder;

/// Tunables for [`Sweeper`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct SweeperSettings {
    /// Time between cleanup cycles.
    #[builder(default = Duration::from_secs(60 * 60))]
    pub interval: Duration,
    /// Maximum short links reclaimed per cycle.
    #[builder(default = 1000)]
    pub batch_size: usize,
    /// Upper bound on one cycle's runtime.
    #[builder(default = Duration::from_secs(60))]
    pub cycle_timeout: Duration,
    /// A short link is stale once its last access is older than this.
    /// Never-accessed links are retained regardless of age.
    #[builder(default = Duration::from_secs(24 * 60 * 60))]
    pub retention: Duration,
}

impl Default for SweeperSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// What one cleanup cycle removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    pub short_links_deleted: usize,
    pub original_links_deleted: u64,
}

/// The expiry sweeper background task.
pub struct Sweeper<S> {
    store: Arc<S>,
    settings: SweeperSettings,
}

impl<S: LinkStore> Sweeper<S> {
    /// Creates a sweeper over the given store.
    pub fn new(store: S, settings: SweeperSettings) -> Self {
        Self {
            store: Arc::new(store),
            settings,
        }
    }

    /// Runs cleanup cycles on the configured interval until `shutdown`
    /// signals.
    ///
    /// Stop is cooperative: a signal observed while waiting ends the
    /// loop without starting another cycle. A cycle that outlives its
    /// timeout is abandoned mid-transaction; the store's drop-rollback
    /// keeps that safe, and the next tick retries naturally.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.settings.interval.as_secs(),
            batch_size = self.settings.batch_size,
            "starting link sweeper"
        );

        let mut ticker = tokio::time::interval(self.settings.interval);
        // The first tick completes immediately; consume it so the
        // first cycle runs one full period after start.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle_bounded().await;
                }
                _ = shutdown.changed() => {
                    info!("link sweeper stopped");
                    return;
                }
            }
        }
    }

    async fn run_cycle_bounded(&self) {
        match tokio::time::timeout(self.settings.cycle_timeout, self.run_cycle()).await {
            Ok(Ok(outcome)) => {
                info!(
                    short_links_deleted = outcome.short_links_deleted,
                    original_links_deleted = outcome.original_links_deleted,
                    "cleanup cycle finished"
                );
            }
            Ok(Err(e)) => {
                error!(error = %e, "cleanup cycle failed");
            }
            Err(_) => {
                error!(
                    timeout_secs = self.settings.cycle_timeout.as_secs(),
                    "cleanup cycle timed out"
                );
            }
        }
    }

    /// One cleanup cycle in a single transaction: find a batch of
    /// stale codes, delete them, delete now-orphaned originals,
    /// commit. Any failure rolls the whole cycle back.
    pub async fn run_cycle(&self) -> Result<SweepOutcome, StoreError> {
        let retention = SignedDuration::try_from(self.settings.retention)
            .map_err(|e| StoreError::Operation(format!("invalid retention window: {e}")))?;
        let threshold = Timestamp::now() - retention;

        let mut tx = self.store.begin().await?;
        match self.sweep_in_tx(&mut tx, threshold).await {
            Ok(outcome) => {
                self.store.commit(tx).await?;
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rb) = self.store.rollback(tx).await {
                    error!(error = %rb, "failed to roll back cleanup transaction");
                }
                Err(e)
            }
        }
    }

    async fn sweep_in_tx(
        &self,
        tx: &mut S::Tx,
        threshold: Timestamp,
    ) -> Result<SweepOutcome, StoreError> {
        let codes = self
            .store
            .find_expired(tx, threshold, self.settings.batch_size)
            .await?;

        self.store.delete_short_links(tx, &codes).await?;
        let original_links_deleted = self.store.delete_orphaned_original_links(tx).await?;

        Ok(SweepOutcome {
            short_links_deleted: codes.len(),
            original_links_deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snaplink_storage::MemoryLinkStore;

    async fn insert_link(store: &MemoryLinkStore, url: &str, code: &str) {
        let mut tx = store.begin().await.unwrap();
        let original = store.insert_original_link(&mut tx, url).await.unwrap();
        store
            .insert_short_link(&mut tx, code, original.id)
            .await
            .unwrap();
        store.commit(tx).await.unwrap();
    }

    fn hours_ago(hours: i64) -> Timestamp {
        Timestamp::now() - SignedDuration::from_hours(hours)
    }

    fn sweeper(store: MemoryLinkStore) -> Sweeper<MemoryLinkStore> {
        Sweeper::new(store, SweeperSettings::default())
    }

    #[tokio::test]
    async fn stale_link_and_sole_original_are_deleted() {
        let store = MemoryLinkStore::new();
        insert_link(&store, "https://example.com/old", "oldOld").await;
        store.set_accessed_at("oldOld", hours_ago(25));

        let outcome = sweeper(store.clone()).run_cycle().await.unwrap();

        assert_eq!(outcome.short_links_deleted, 1);
        assert_eq!(outcome.original_links_deleted, 1);
        assert_eq!(store.short_link_count(), 0);
        assert_eq!(store.original_link_count(), 0);
    }

    #[tokio::test]
    async fn recently_accessed_link_survives() {
        let store = MemoryLinkStore::new();
        insert_link(&store, "https://example.com/fresh", "freshy").await;
        store.set_accessed_at("freshy", hours_ago(1));

        let outcome = sweeper(store.clone()).run_cycle().await.unwrap();

        assert_eq!(outcome.short_links_deleted, 0);
        assert_eq!(store.short_link_count(), 1);
        assert_eq!(store.original_link_count(), 1);
    }

    #[tokio::test]
    async fn never_accessed_link_is_retained() {
        let store = MemoryLinkStore::new();
        insert_link(&store, "https://example.com/unused", "unused").await;

        let outcome = sweeper(store.clone()).run_cycle().await.unwrap();

        assert_eq!(outcome.short_links_deleted, 0);
        assert_eq!(store.short_link_count(), 1);
    }

    #[tokio::test]
    async fn original_survives_while_still_referenced() {
        let store = MemoryLinkStore::new();
        insert_link(&store, "https://example.com", "staleA").await;
        insert_link(&store, "https://example.com", "liveBB").await;
        store.set_accessed_at("staleA", hours_ago(30));
        store.set_accessed_at("liveBB", hours_ago(1));

        let outcome = sweeper(store.clone()).run_cycle().await.unwrap();

        assert_eq!(outcome.short_links_deleted, 1);
        assert_eq!(outcome.original_links_deleted, 0);
        assert_eq!(store.original_link_count(), 1);
    }

    #[tokio::test]
    async fn batch_size_bounds_one_cycle() {
        let store = MemoryLinkStore::new();
        for i in 0..3 {
            let code = format!("stale{i}");
            insert_link(&store, &format!("https://example.com/{i}"), &code).await;
            store.set_accessed_at(&code, hours_ago(48));
        }

        let settings = SweeperSettings::builder().batch_size(2).build();
        let sweeper = Sweeper::new(store.clone(), settings);

        let outcome = sweeper.run_cycle().await.unwrap();
        assert_eq!(outcome.short_links_deleted, 2);
        assert_eq!(store.short_link_count(), 1);

        // The remainder goes on the next tick.
        let outcome = sweeper.run_cycle().await.unwrap();
        assert_eq!(outcome.short_links_deleted, 1);
        assert_eq!(store.short_link_count(), 0);
    }

    #[tokio::test]
    async fn stop_signal_ends_the_loop() {
        let store = MemoryLinkStore::new();
        let settings = SweeperSettings::builder()
            .interval(Duration::from_millis(10))
            .build();
        let sweeper = Sweeper::new(store, settings);

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { sweeper.run(stop_rx).await });

        tokio::time::sleep(Duration::from_millis(30)).await;
        stop_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
