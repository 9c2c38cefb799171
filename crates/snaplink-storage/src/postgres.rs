use async_trait::async_trait;
use jiff::Timestamp;
use snaplink_core::error::{StoreError, StoreResult};
use snaplink_core::model::{LinkStats, OriginalLink, ShortLink};
use snaplink_core::store::LinkStore;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

/// Postgres implementation of the store contract.
///
/// Timestamps are persisted as unix seconds (`BIGINT`); `accessed_at`
/// stays `NULL` until the first successful resolution. The unique
/// constraints on `links.url` and `short_links.short_url` back the
/// engine-level uniqueness discipline as defense-in-depth.
#[derive(Debug, Clone)]
pub struct PgLinkStore {
    pool: PgPool,
}

impl PgLinkStore {
    /// Creates a store from an existing Postgres connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new Postgres connection pool.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Operation(format!("migration failed: {e}")))
    }
}

fn now_unix_seconds() -> i64 {
    Timestamp::now().as_second()
}

fn parse_timestamp(seconds: i64) -> StoreResult<Timestamp> {
    Timestamp::from_second(seconds)
        .map_err(|e| StoreError::InvalidData(format!("invalid timestamp '{seconds}': {e}")))
}

fn parse_optional_timestamp(seconds: Option<i64>) -> StoreResult<Option<Timestamp>> {
    seconds.map(parse_timestamp).transpose()
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StoreError::InvalidData(message),
        _ => StoreError::Query(message),
    }
}

fn short_link_from_row(row: &PgRow) -> StoreResult<ShortLink> {
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let accessed_at: Option<i64> = row.try_get("accessed_at").map_err(map_sqlx_error)?;

    Ok(ShortLink {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        original_link_id: row.try_get("id_url").map_err(map_sqlx_error)?,
        code: row.try_get("short_url").map_err(map_sqlx_error)?,
        created_at: parse_timestamp(created_at)?,
        accessed_at: parse_optional_timestamp(accessed_at)?,
        accessed_count: row.try_get("accessed_count").map_err(map_sqlx_error)?,
    })
}

fn original_link_from_row(row: &PgRow) -> StoreResult<OriginalLink> {
    Ok(OriginalLink {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        url: row.try_get("url").map_err(map_sqlx_error)?,
    })
}

#[async_trait]
impl LinkStore for PgLinkStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> StoreResult<Self::Tx> {
        // Read committed is the Postgres default isolation level.
        self.pool.begin().await.map_err(map_sqlx_error)
    }

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()> {
        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()> {
        tx.rollback().await.map_err(map_sqlx_error)
    }

    async fn find_original_link(
        &self,
        tx: &mut Self::Tx,
        url: &str,
    ) -> StoreResult<Option<OriginalLink>> {
        let row = sqlx::query(
            r#"
            SELECT id, url
            FROM links
            WHERE url = $1
            "#,
        )
        .bind(url)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(original_link_from_row).transpose()
    }

    async fn insert_original_link(
        &self,
        tx: &mut Self::Tx,
        url: &str,
    ) -> StoreResult<OriginalLink> {
        let row = sqlx::query(
            r#"
            INSERT INTO links (url)
            VALUES ($1)
            ON CONFLICT (url) DO UPDATE SET url = EXCLUDED.url
            RETURNING id, url
            "#,
        )
        .bind(url)
        .fetch_one(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        original_link_from_row(&row)
    }

    async fn find_short_link(
        &self,
        tx: &mut Self::Tx,
        code: &str,
    ) -> StoreResult<Option<ShortLink>> {
        let row = sqlx::query(
            r#"
            SELECT id, id_url, short_url, created_at, accessed_at, accessed_count
            FROM short_links
            WHERE short_url = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(short_link_from_row).transpose()
    }

    async fn insert_short_link(
        &self,
        tx: &mut Self::Tx,
        code: &str,
        original_link_id: i64,
    ) -> StoreResult<ShortLink> {
        let row = sqlx::query(
            r#"
            INSERT INTO short_links (id_url, short_url, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, id_url, short_url, created_at, accessed_at, accessed_count
            "#,
        )
        .bind(original_link_id)
        .bind(code)
        .bind(now_unix_seconds())
        .fetch_one(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        short_link_from_row(&row)
    }

    async fn resolve_and_bump_access(
        &self,
        tx: &mut Self::Tx,
        code: &str,
    ) -> StoreResult<Option<String>> {
        let row = sqlx::query(
            r#"
            WITH bumped AS (
                UPDATE short_links
                SET accessed_at = $2,
                    accessed_count = accessed_count + 1
                WHERE short_url = $1
                RETURNING id_url
            )
            SELECT l.url
            FROM links l
            WHERE l.id = (SELECT id_url FROM bumped)
            "#,
        )
        .bind(code)
        .bind(now_unix_seconds())
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|row| row.try_get("url").map_err(map_sqlx_error))
            .transpose()
    }

    async fn bump_access(&self, tx: &mut Self::Tx, code: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE short_links
            SET accessed_at = $2,
                accessed_count = accessed_count + 1
            WHERE short_url = $1
            "#,
        )
        .bind(code)
        .bind(now_unix_seconds())
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn list_all(&self, tx: &mut Self::Tx) -> StoreResult<Vec<LinkStats>> {
        let rows = sqlx::query(
            r#"
            SELECT l.url, sl.short_url, sl.created_at, sl.accessed_at, sl.accessed_count
            FROM short_links AS sl
            INNER JOIN links AS l ON sl.id_url = l.id
            ORDER BY sl.created_at DESC, sl.id DESC
            "#,
        )
        .fetch_all(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
                let accessed_at: Option<i64> = row.try_get("accessed_at").map_err(map_sqlx_error)?;

                Ok(LinkStats {
                    url: row.try_get("url").map_err(map_sqlx_error)?,
                    short_code: row.try_get("short_url").map_err(map_sqlx_error)?,
                    created_at: parse_timestamp(created_at)?,
                    accessed_at: parse_optional_timestamp(accessed_at)?,
                    accessed_count: row.try_get("accessed_count").map_err(map_sqlx_error)?,
                })
            })
            .collect()
    }

    async fn find_expired(
        &self,
        tx: &mut Self::Tx,
        older_than: Timestamp,
        limit: usize,
    ) -> StoreResult<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT short_url
            FROM short_links
            WHERE accessed_at IS NOT NULL
              AND accessed_at < $1
            ORDER BY accessed_at
            LIMIT $2
            "#,
        )
        .bind(older_than.as_second())
        .bind(limit as i64)
        .fetch_all(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| row.try_get("short_url").map_err(map_sqlx_error))
            .collect()
    }

    async fn delete_short_links(&self, tx: &mut Self::Tx, codes: &[String]) -> StoreResult<()> {
        if codes.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            DELETE FROM short_links
            WHERE short_url = ANY($1)
            "#,
        )
        .bind(codes)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_orphaned_original_links(&self, tx: &mut Self::Tx) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM links l
            WHERE NOT EXISTS (
                SELECT 1
                FROM short_links sl
                WHERE sl.id_url = l.id
            )
            "#,
        )
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
