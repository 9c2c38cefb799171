//! Postgres-backed store tests. They need a live database and are
//! ignored by default; point `SNAPLINK_TEST_DATABASE_URL` at a
//! disposable Postgres instance and run with `--ignored`.

use jiff::{SignedDuration, Timestamp};
use snaplink_core::LinkStore;
use snaplink_storage::PgLinkStore;

const DATABASE_URL_ENV: &str = "SNAPLINK_TEST_DATABASE_URL";

struct Fixture {
    store: PgLinkStore,
}

impl Fixture {
    async fn start() -> Self {
        let url = std::env::var(DATABASE_URL_ENV)
            .unwrap_or_else(|_| panic!("{DATABASE_URL_ENV} must point at a test database"));
        let store = PgLinkStore::connect(&url).await.expect("connect postgres");
        store.migrate().await.expect("apply migrations");

        sqlx::query("TRUNCATE short_links, links RESTART IDENTITY CASCADE")
            .execute(store.pool())
            .await
            .expect("reset tables");

        Self { store }
    }

    async fn backdate_access(&self, code: &str, accessed_at: Timestamp) {
        sqlx::query("UPDATE short_links SET accessed_at = $2 WHERE short_url = $1")
            .bind(code)
            .bind(accessed_at.as_second())
            .execute(self.store.pool())
            .await
            .expect("backdate access");
    }
}

#[tokio::test]
#[ignore]
async fn create_and_resolve_round_trip() {
    let fixture = Fixture::start().await;
    let store = &fixture.store;

    let mut tx = store.begin().await.unwrap();
    let original = store
        .insert_original_link(&mut tx, "https://example.com/a")
        .await
        .unwrap();
    let short = store
        .insert_short_link(&mut tx, "abcdef", original.id)
        .await
        .unwrap();
    store.commit(tx).await.unwrap();

    assert_eq!(short.code, "abcdef");
    assert_eq!(short.accessed_count, 0);
    assert!(short.accessed_at.is_none());

    let mut tx = store.begin().await.unwrap();
    let url = store
        .resolve_and_bump_access(&mut tx, "abcdef")
        .await
        .unwrap();
    let bumped = store.find_short_link(&mut tx, "abcdef").await.unwrap();
    store.commit(tx).await.unwrap();

    assert_eq!(url.as_deref(), Some("https://example.com/a"));
    let bumped = bumped.unwrap();
    assert_eq!(bumped.accessed_count, 1);
    assert!(bumped.accessed_at.is_some());
}

#[tokio::test]
#[ignore]
async fn insert_original_link_converges_on_duplicate_url() {
    let fixture = Fixture::start().await;
    let store = &fixture.store;

    let mut tx = store.begin().await.unwrap();
    let first = store
        .insert_original_link(&mut tx, "https://example.com/dup")
        .await
        .unwrap();
    let second = store
        .insert_original_link(&mut tx, "https://example.com/dup")
        .await
        .unwrap();
    store.commit(tx).await.unwrap();

    assert_eq!(first.id, second.id);
}

#[tokio::test]
#[ignore]
async fn rollback_discards_inserted_rows() {
    let fixture = Fixture::start().await;
    let store = &fixture.store;

    let mut tx = store.begin().await.unwrap();
    let original = store
        .insert_original_link(&mut tx, "https://example.com/rollback")
        .await
        .unwrap();
    store
        .insert_short_link(&mut tx, "gonewt", original.id)
        .await
        .unwrap();
    store.rollback(tx).await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let found = store.find_short_link(&mut tx, "gonewt").await.unwrap();
    let listed = store.list_all(&mut tx).await.unwrap();
    store.commit(tx).await.unwrap();

    assert!(found.is_none());
    assert!(listed.is_empty());
}

#[tokio::test]
#[ignore]
async fn resolve_of_unknown_code_is_none() {
    let fixture = Fixture::start().await;
    let store = &fixture.store;

    let mut tx = store.begin().await.unwrap();
    let url = store
        .resolve_and_bump_access(&mut tx, "nosuch")
        .await
        .unwrap();
    store.commit(tx).await.unwrap();

    assert!(url.is_none());
}

#[tokio::test]
#[ignore]
async fn list_all_is_newest_first() {
    let fixture = Fixture::start().await;
    let store = &fixture.store;

    let mut tx = store.begin().await.unwrap();
    for (code, url) in [("first1", "https://example.com/1"), ("second", "https://example.com/2")] {
        let original = store.insert_original_link(&mut tx, url).await.unwrap();
        store.insert_short_link(&mut tx, code, original.id).await.unwrap();
    }
    store.commit(tx).await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let listed = store.list_all(&mut tx).await.unwrap();
    store.commit(tx).await.unwrap();

    assert_eq!(listed.len(), 2);
    // Equal creation seconds fall back to id order, so the later insert
    // still lists first.
    assert_eq!(listed[0].short_code, "second");
    assert_eq!(listed[1].short_code, "first1");
}

#[tokio::test]
#[ignore]
async fn expired_sweep_reclaims_stale_links_and_orphans() {
    let fixture = Fixture::start().await;
    let store = &fixture.store;

    let mut tx = store.begin().await.unwrap();
    for (code, url) in [
        ("stale1", "https://example.com/stale"),
        ("fresh1", "https://example.com/fresh"),
        ("never1", "https://example.com/never"),
    ] {
        let original = store.insert_original_link(&mut tx, url).await.unwrap();
        store.insert_short_link(&mut tx, code, original.id).await.unwrap();
    }
    store.resolve_and_bump_access(&mut tx, "stale1").await.unwrap();
    store.resolve_and_bump_access(&mut tx, "fresh1").await.unwrap();
    store.commit(tx).await.unwrap();

    let two_days_ago = Timestamp::now() - SignedDuration::from_hours(48);
    fixture.backdate_access("stale1", two_days_ago).await;

    let threshold = Timestamp::now() - SignedDuration::from_hours(24);
    let mut tx = store.begin().await.unwrap();
    let expired = store.find_expired(&mut tx, threshold, 100).await.unwrap();
    assert_eq!(expired, vec!["stale1".to_string()]);

    store.delete_short_links(&mut tx, &expired).await.unwrap();
    let orphans = store.delete_orphaned_original_links(&mut tx).await.unwrap();
    store.commit(tx).await.unwrap();

    assert_eq!(orphans, 1);

    let mut tx = store.begin().await.unwrap();
    let listed = store.list_all(&mut tx).await.unwrap();
    store.commit(tx).await.unwrap();

    let codes: Vec<_> = listed.iter().map(|s| s.short_code.as_str()).collect();
    assert!(codes.contains(&"fresh1"));
    assert!(codes.contains(&"never1"));
    assert!(!codes.contains(&"stale1"));
}
