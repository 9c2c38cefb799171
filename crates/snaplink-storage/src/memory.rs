use async_trait::async_trait;
use jiff::Timestamp;
use parking_lot::Mutex;
use snaplink_core::error::{StoreError, StoreResult};
use snaplink_core::model::{LinkStats, OriginalLink, ShortLink};
use snaplink_core::store::LinkStore;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct LinkRow {
    id: i64,
    url: String,
}

#[derive(Debug, Clone)]
struct ShortRow {
    id: i64,
    id_url: i64,
    code: String,
    created_at: i64,
    accessed_at: Option<i64>,
    accessed_count: i64,
}

impl ShortRow {
    fn to_short_link(&self) -> StoreResult<ShortLink> {
        Ok(ShortLink {
            id: self.id,
            original_link_id: self.id_url,
            code: self.code.clone(),
            created_at: parse_timestamp(self.created_at)?,
            accessed_at: self.accessed_at.map(parse_timestamp).transpose()?,
            accessed_count: self.accessed_count,
        })
    }
}

#[derive(Debug, Default)]
struct State {
    links: Vec<LinkRow>,
    short_links: Vec<ShortRow>,
    next_link_id: i64,
    next_short_id: i64,
}

/// Per-statement undo records, replayed in reverse on rollback.
#[derive(Debug)]
enum Undo {
    RemoveOriginal { id: i64 },
    RemoveShort { code: String },
    RestoreAccess { code: String, accessed_at: Option<i64>, accessed_count: i64 },
    RestoreShortRows(Vec<ShortRow>),
    RestoreLinkRows(Vec<LinkRow>),
}

/// Transaction handle over [`MemoryLinkStore`]: a journal of undo
/// records for the statements executed so far. Dropping an unfinished
/// handle replays the journal, making an abandoned transaction
/// equivalent to a rollback.
#[derive(Debug)]
pub struct MemoryTx {
    state: Arc<Mutex<State>>,
    journal: Vec<Undo>,
    committed: bool,
}

impl MemoryTx {
    fn undo_all(&mut self) {
        let mut state = self.state.lock();

        for undo in self.journal.drain(..).rev() {
            match undo {
                Undo::RemoveOriginal { id } => {
                    state.links.retain(|row| row.id != id);
                }
                Undo::RemoveShort { code } => {
                    state.short_links.retain(|row| row.code != code);
                }
                Undo::RestoreAccess { code, accessed_at, accessed_count } => {
                    if let Some(row) =
                        state.short_links.iter_mut().find(|row| row.code == code)
                    {
                        row.accessed_at = accessed_at;
                        row.accessed_count = accessed_count;
                    }
                }
                Undo::RestoreShortRows(rows) => {
                    state.short_links.extend(rows);
                }
                Undo::RestoreLinkRows(rows) => {
                    state.links.extend(rows);
                }
            }
        }
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if !self.committed {
            self.undo_all();
        }
    }
}

/// In-memory implementation of the store contract for engine and
/// sweeper tests.
///
/// Statements apply to the shared state immediately; rollback, and the
/// drop of a handle that was never committed, replay the transaction's
/// undo journal in reverse under the state lock. Uncommitted writes
/// are therefore visible to concurrent readers, which is what the
/// engine's reservation loop relies on to spot in-flight codes.
#[derive(Debug, Clone, Default)]
pub struct MemoryLinkStore {
    state: Arc<Mutex<State>>,
}

impl MemoryLinkStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of original-link rows currently stored.
    pub fn original_link_count(&self) -> usize {
        self.state.lock().links.len()
    }

    /// Number of short-link rows currently stored.
    pub fn short_link_count(&self) -> usize {
        self.state.lock().short_links.len()
    }

    /// Backdates a short link's last access, for expiry tests.
    pub fn set_accessed_at(&self, code: &str, accessed_at: Timestamp) {
        let mut state = self.state.lock();
        if let Some(row) = state.short_links.iter_mut().find(|row| row.code == code) {
            row.accessed_at = Some(accessed_at.as_second());
        }
    }

    /// Backdates a short link's creation time, for ordering tests.
    pub fn set_created_at(&self, code: &str, created_at: Timestamp) {
        let mut state = self.state.lock();
        if let Some(row) = state.short_links.iter_mut().find(|row| row.code == code) {
            row.created_at = created_at.as_second();
        }
    }
}

fn parse_timestamp(seconds: i64) -> StoreResult<Timestamp> {
    Timestamp::from_second(seconds)
        .map_err(|e| StoreError::InvalidData(format!("invalid timestamp '{seconds}': {e}")))
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<Self::Tx> {
        Ok(MemoryTx {
            state: Arc::clone(&self.state),
            journal: Vec::new(),
            committed: false,
        })
    }

    async fn commit(&self, mut tx: Self::Tx) -> StoreResult<()> {
        tx.committed = true;
        Ok(())
    }

    async fn rollback(&self, mut tx: Self::Tx) -> StoreResult<()> {
        tx.undo_all();
        Ok(())
    }

    async fn find_original_link(
        &self,
        _tx: &mut Self::Tx,
        url: &str,
    ) -> StoreResult<Option<OriginalLink>> {
        let state = self.state.lock();
        Ok(state
            .links
            .iter()
            .find(|row| row.url == url)
            .map(|row| OriginalLink { id: row.id, url: row.url.clone() }))
    }

    async fn insert_original_link(
        &self,
        tx: &mut Self::Tx,
        url: &str,
    ) -> StoreResult<OriginalLink> {
        let mut state = self.state.lock();

        // Upsert semantics: a concurrent insert of the same URL
        // converges on the existing row.
        if let Some(row) = state.links.iter().find(|row| row.url == url) {
            return Ok(OriginalLink { id: row.id, url: row.url.clone() });
        }

        state.next_link_id += 1;
        let id = state.next_link_id;
        state.links.push(LinkRow { id, url: url.to_string() });
        tx.journal.push(Undo::RemoveOriginal { id });

        Ok(OriginalLink { id, url: url.to_string() })
    }

    async fn find_short_link(
        &self,
        _tx: &mut Self::Tx,
        code: &str,
    ) -> StoreResult<Option<ShortLink>> {
        let state = self.state.lock();
        state
            .short_links
            .iter()
            .find(|row| row.code == code)
            .map(ShortRow::to_short_link)
            .transpose()
    }

    async fn insert_short_link(
        &self,
        tx: &mut Self::Tx,
        code: &str,
        original_link_id: i64,
    ) -> StoreResult<ShortLink> {
        let mut state = self.state.lock();

        if state.short_links.iter().any(|row| row.code == code) {
            return Err(StoreError::Query(format!(
                "duplicate key value violates unique constraint: '{code}'"
            )));
        }
        if !state.links.iter().any(|row| row.id == original_link_id) {
            return Err(StoreError::Query(format!(
                "foreign key violation: no original link with id {original_link_id}"
            )));
        }

        state.next_short_id += 1;
        let row = ShortRow {
            id: state.next_short_id,
            id_url: original_link_id,
            code: code.to_string(),
            created_at: Timestamp::now().as_second(),
            accessed_at: None,
            accessed_count: 0,
        };
        let link = row.to_short_link()?;
        state.short_links.push(row);
        tx.journal.push(Undo::RemoveShort { code: code.to_string() });

        Ok(link)
    }

    async fn resolve_and_bump_access(
        &self,
        tx: &mut Self::Tx,
        code: &str,
    ) -> StoreResult<Option<String>> {
        let mut state = self.state.lock();

        let Some(index) = state.short_links.iter().position(|row| row.code == code) else {
            return Ok(None);
        };

        let row = &mut state.short_links[index];
        tx.journal.push(Undo::RestoreAccess {
            code: row.code.clone(),
            accessed_at: row.accessed_at,
            accessed_count: row.accessed_count,
        });
        row.accessed_at = Some(Timestamp::now().as_second());
        row.accessed_count += 1;

        let id_url = row.id_url;
        Ok(state
            .links
            .iter()
            .find(|link| link.id == id_url)
            .map(|link| link.url.clone()))
    }

    async fn bump_access(&self, tx: &mut Self::Tx, code: &str) -> StoreResult<()> {
        self.resolve_and_bump_access(tx, code).await.map(|_| ())
    }

    async fn list_all(&self, _tx: &mut Self::Tx) -> StoreResult<Vec<LinkStats>> {
        let state = self.state.lock();

        let mut rows: Vec<&ShortRow> = state.short_links.iter().collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        rows.into_iter()
            .map(|row| {
                let url = state
                    .links
                    .iter()
                    .find(|link| link.id == row.id_url)
                    .map(|link| link.url.clone())
                    .ok_or_else(|| {
                        StoreError::InvalidData(format!(
                            "short link '{}' references missing original {}",
                            row.code, row.id_url
                        ))
                    })?;
                Ok(row.to_short_link()?.into_stats(url))
            })
            .collect()
    }

    async fn find_expired(
        &self,
        _tx: &mut Self::Tx,
        older_than: Timestamp,
        limit: usize,
    ) -> StoreResult<Vec<String>> {
        let threshold = older_than.as_second();
        let state = self.state.lock();

        let mut expired: Vec<&ShortRow> = state
            .short_links
            .iter()
            .filter(|row| row.accessed_at.is_some_and(|at| at < threshold))
            .collect();
        expired.sort_by_key(|row| row.accessed_at);

        Ok(expired
            .into_iter()
            .take(limit)
            .map(|row| row.code.clone())
            .collect())
    }

    async fn delete_short_links(&self, tx: &mut Self::Tx, codes: &[String]) -> StoreResult<()> {
        if codes.is_empty() {
            return Ok(());
        }

        let mut state = self.state.lock();
        let (removed, kept): (Vec<ShortRow>, Vec<ShortRow>) = state
            .short_links
            .drain(..)
            .partition(|row| codes.contains(&row.code));
        state.short_links = kept;
        tx.journal.push(Undo::RestoreShortRows(removed));

        Ok(())
    }

    async fn delete_orphaned_original_links(&self, tx: &mut Self::Tx) -> StoreResult<u64> {
        let mut state = self.state.lock();

        let referenced: Vec<i64> = state.short_links.iter().map(|row| row.id_url).collect();
        let (kept, removed): (Vec<LinkRow>, Vec<LinkRow>) = state
            .links
            .drain(..)
            .partition(|row| referenced.contains(&row.id));
        state.links = kept;

        let count = removed.len() as u64;
        tx.journal.push(Undo::RestoreLinkRows(removed));

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryLinkStore, i64) {
        let store = MemoryLinkStore::new();
        let mut tx = store.begin().await.unwrap();
        let original = store
            .insert_original_link(&mut tx, "https://example.com")
            .await
            .unwrap();
        store
            .insert_short_link(&mut tx, "abcDEF", original.id)
            .await
            .unwrap();
        store.commit(tx).await.unwrap();
        (store, original.id)
    }

    #[tokio::test]
    async fn rollback_undoes_inserts() {
        let store = MemoryLinkStore::new();

        let mut tx = store.begin().await.unwrap();
        let original = store
            .insert_original_link(&mut tx, "https://example.com")
            .await
            .unwrap();
        store
            .insert_short_link(&mut tx, "abcDEF", original.id)
            .await
            .unwrap();
        store.rollback(tx).await.unwrap();

        assert_eq!(store.original_link_count(), 0);
        assert_eq!(store.short_link_count(), 0);
    }

    #[tokio::test]
    async fn dropped_unfinished_tx_rolls_back() {
        let store = MemoryLinkStore::new();

        let mut tx = store.begin().await.unwrap();
        let original = store
            .insert_original_link(&mut tx, "https://example.com")
            .await
            .unwrap();
        store
            .insert_short_link(&mut tx, "abcDEF", original.id)
            .await
            .unwrap();
        drop(tx);

        assert_eq!(store.original_link_count(), 0);
        assert_eq!(store.short_link_count(), 0);
    }

    #[tokio::test]
    async fn dropped_unfinished_tx_restores_deleted_rows() {
        let (store, _) = seeded().await;

        let mut tx = store.begin().await.unwrap();
        store
            .delete_short_links(&mut tx, &["abcDEF".to_string()])
            .await
            .unwrap();
        store.delete_orphaned_original_links(&mut tx).await.unwrap();
        drop(tx);

        assert_eq!(store.short_link_count(), 1);
        assert_eq!(store.original_link_count(), 1);
    }

    #[tokio::test]
    async fn rollback_restores_access_fields() {
        let (store, _) = seeded().await;

        let mut tx = store.begin().await.unwrap();
        let url = store
            .resolve_and_bump_access(&mut tx, "abcDEF")
            .await
            .unwrap();
        assert_eq!(url.as_deref(), Some("https://example.com"));
        store.rollback(tx).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let link = store
            .find_short_link(&mut tx, "abcDEF")
            .await
            .unwrap()
            .unwrap();
        store.commit(tx).await.unwrap();

        assert_eq!(link.accessed_count, 0);
        assert!(link.accessed_at.is_none());
    }

    #[tokio::test]
    async fn rollback_restores_deleted_rows() {
        let (store, _) = seeded().await;

        let mut tx = store.begin().await.unwrap();
        store
            .delete_short_links(&mut tx, &["abcDEF".to_string()])
            .await
            .unwrap();
        let removed = store.delete_orphaned_original_links(&mut tx).await.unwrap();
        assert_eq!(removed, 1);
        store.rollback(tx).await.unwrap();

        assert_eq!(store.short_link_count(), 1);
        assert_eq!(store.original_link_count(), 1);
    }

    #[tokio::test]
    async fn insert_original_link_is_idempotent() {
        let store = MemoryLinkStore::new();

        let mut tx = store.begin().await.unwrap();
        let first = store
            .insert_original_link(&mut tx, "https://example.com")
            .await
            .unwrap();
        let second = store
            .insert_original_link(&mut tx, "https://example.com")
            .await
            .unwrap();
        store.commit(tx).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.original_link_count(), 1);
    }

    #[tokio::test]
    async fn duplicate_short_code_is_rejected() {
        let (store, original_id) = seeded().await;

        let mut tx = store.begin().await.unwrap();
        let err = store
            .insert_short_link(&mut tx, "abcDEF", original_id)
            .await
            .unwrap_err();
        store.rollback(tx).await.unwrap();

        assert!(matches!(err, StoreError::Query(_)));
    }

    #[tokio::test]
    async fn never_accessed_rows_are_not_expired() {
        let (store, _) = seeded().await;

        let mut tx = store.begin().await.unwrap();
        let expired = store
            .find_expired(&mut tx, Timestamp::now(), 10)
            .await
            .unwrap();
        store.commit(tx).await.unwrap();

        assert!(expired.is_empty());
    }
}
