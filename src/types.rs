use serde::Serialize;

// ---------------------------------------------------------------------------
// Ingestion batch
// ---------------------------------------------------------------------------

/// One product as observed on a listing page, before persistence.
/// `stock: None` means "could not be determined" — never zero.
#[derive(Debug, Clone)]
pub struct RawProduct {
    pub product_id: String,
    pub name: String,
    pub url: String,
    pub stock: Option<i64>,
}

// ---------------------------------------------------------------------------
// Classification results — consumed by the report formatter
// ---------------------------------------------------------------------------

/// Latest stock at or below the low-stock threshold.
#[derive(Debug, Clone, Serialize)]
pub struct ShortSupplyItem {
    pub product_id: String,
    pub name: String,
    pub url: String,
    pub stock: i64,
}

/// Significant drop between the two most recent observations.
#[derive(Debug, Clone, Serialize)]
pub struct HighDemandItem {
    pub product_id: String,
    pub name: String,
    pub url: String,
    pub stock: i64,
    pub prev_stock: i64,
    pub delta: i64,
    pub percent: Option<i64>,
}

/// Crossed from above the shortage threshold to at-or-below it
/// within the short window.
#[derive(Debug, Clone, Serialize)]
pub struct IncreasedShortageItem {
    pub product_id: String,
    pub name: String,
    pub url: String,
    pub stock_then: i64,
    pub stock_now: i64,
    /// stock_now - stock_then; expected <= 0.
    pub delta: i64,
}

/// Significant stock drop across the short window.
#[derive(Debug, Clone, Serialize)]
pub struct IncreasedDemandItem {
    pub product_id: String,
    pub name: String,
    pub url: String,
    pub stock_then: i64,
    pub stock_now: i64,
    pub delta: i64,
    pub percent: Option<i64>,
}

/// Units sold (oldest minus newest stock) across the long window.
#[derive(Debug, Clone, Serialize)]
pub struct TopSellerItem {
    pub product_id: String,
    pub name: String,
    pub url: String,
    pub sold: i64,
    /// None when the window opened at zero stock.
    pub sold_pct: Option<i64>,
}

/// Everything one analysis pass produces, in report order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrendReport {
    pub high_demand: Vec<HighDemandItem>,
    pub short_supply: Vec<ShortSupplyItem>,
    pub increased_shortage: Vec<IncreasedShortageItem>,
    pub increased_demand: Vec<IncreasedDemandItem>,
    pub top_sellers: Vec<TopSellerItem>,
}
