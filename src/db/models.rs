/// Database row types for the snapshot and history tables.
/// Used by sqlx for typed queries.

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub product_id: String,
    pub name: String,
    pub url: String,
    /// NULL = stock could not be determined on the last observation.
    pub last_stock: Option<i64>,
    /// Unix seconds.
    pub last_seen: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ObservationRow {
    pub product_id: String,
    pub stock: Option<i64>,
    /// Unix seconds.
    pub observed_at: i64,
}
