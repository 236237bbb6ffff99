use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::models::{ObservationRow, ProductRow};
use crate::error::Result;
use crate::types::RawProduct;

/// Durable stock history: a latest-snapshot table plus an append-only
/// observation log, both keyed by product id. Owns the SQLite pool;
/// all analysis reads go through here.
#[derive(Debug, Clone)]
pub struct ObservationStore {
    pool: sqlx::SqlitePool,
}

impl ObservationStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates tables on first run. Matches the layout the analysis
    /// queries assume; `(product_id, observed_at)` index keeps the
    /// windowed scans off a full table walk.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                product_id TEXT PRIMARY KEY,
                name       TEXT NOT NULL,
                url        TEXT NOT NULL,
                last_stock INTEGER,
                last_seen  INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS observations (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id  TEXT NOT NULL,
                stock       INTEGER,
                observed_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_observations_product
                ON observations (product_id, observed_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upserts the snapshot row and appends one history row, stamped now.
    pub async fn record(&self, product: &RawProduct) -> Result<()> {
        self.record_at(product, now_ts()).await
    }

    /// Timestamp-injected form of [`record`](Self::record), used for
    /// backfill and tests. Snapshot and history commit in one
    /// transaction so a crash never leaves one without the other.
    pub async fn record_at(&self, product: &RawProduct, observed_at: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (product_id, name, url, last_stock, last_seen)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(product_id) DO UPDATE SET
                name = excluded.name,
                url = excluded.url,
                last_stock = excluded.last_stock,
                last_seen = excluded.last_seen
            "#,
        )
        .bind(&product.product_id)
        .bind(&product.name)
        .bind(&product.url)
        .bind(product.stock)
        .bind(observed_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO observations (product_id, stock, observed_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&product.product_id)
        .bind(product.stock)
        .bind(observed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Most recent observation for a product, or None if never observed.
    pub async fn latest(&self, product_id: &str) -> Result<Option<ObservationRow>> {
        let row = sqlx::query_as::<_, ObservationRow>(
            r#"
            SELECT product_id, stock, observed_at
            FROM observations
            WHERE product_id = ?
            ORDER BY observed_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Up to two most recent observations, newest first. Same-second
    /// inserts tie-break on rowid so insertion order is never reordered.
    pub async fn latest_two(&self, product_id: &str) -> Result<Vec<ObservationRow>> {
        let rows = sqlx::query_as::<_, ObservationRow>(
            r#"
            SELECT product_id, stock, observed_at
            FROM observations
            WHERE product_id = ?
            ORDER BY observed_at DESC, id DESC
            LIMIT 2
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// All observations at or after `cutoff`, oldest first.
    pub async fn since(&self, product_id: &str, cutoff: i64) -> Result<Vec<ObservationRow>> {
        let rows = sqlx::query_as::<_, ObservationRow>(
            r#"
            SELECT product_id, stock, observed_at
            FROM observations
            WHERE product_id = ? AND observed_at >= ?
            ORDER BY observed_at ASC, id ASC
            "#,
        )
        .bind(product_id)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Every known snapshot row.
    pub async fn all_products(&self) -> Result<Vec<ProductRow>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT product_id, name, url, last_stock, last_seen
            FROM products
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

pub fn now_ts() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// In-memory store for tests. Single connection — each SQLite
/// `:memory:` connection is its own database.
#[cfg(test)]
pub async fn memory_store() -> ObservationStore {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    let store = ObservationStore::new(pool);
    store.init_schema().await.expect("schema init");
    store
}
