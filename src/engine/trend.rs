use crate::config::Thresholds;
use crate::db::models::ObservationRow;
use crate::db::store::{now_ts, ObservationStore};
use crate::error::Result;
use crate::types::{
    HighDemandItem, IncreasedDemandItem, IncreasedShortageItem, ShortSupplyItem, TopSellerItem,
    TrendReport,
};

const SECS_PER_DAY: i64 = 86_400;

/// Read-only classification pass over the observation store. All five
/// operations are pure functions of the store contents plus the
/// thresholds; none of them write.
pub struct TrendEngine {
    store: ObservationStore,
    thresholds: Thresholds,
}

impl TrendEngine {
    pub fn new(store: ObservationStore, thresholds: Thresholds) -> Self {
        Self { store, thresholds }
    }

    /// Runs every classification once, in report order.
    pub async fn analyze(&self) -> Result<TrendReport> {
        Ok(TrendReport {
            high_demand: self.high_demand().await?,
            short_supply: self.short_supply().await?,
            increased_shortage: self.increased_shortage().await?,
            increased_demand: self.increased_demand().await?,
            top_sellers: self.top_sellers().await?,
        })
    }

    /// Products whose latest stock is known and at or below the
    /// low-stock threshold, lowest first. Unknown stock is skipped,
    /// never treated as zero.
    pub async fn short_supply(&self) -> Result<Vec<ShortSupplyItem>> {
        let mut items = Vec::new();
        for p in self.store.all_products().await? {
            let Some(stock) = p.last_stock else { continue };
            if stock <= self.thresholds.low_stock_threshold {
                items.push(ShortSupplyItem {
                    product_id: p.product_id,
                    name: p.name,
                    url: p.url,
                    stock,
                });
            }
        }
        items.sort_by_key(|i| i.stock);
        Ok(items)
    }

    /// Two-sample demand: the drop between the two most recent
    /// observations beats both the absolute and relative floors.
    /// Largest drop first.
    pub async fn high_demand(&self) -> Result<Vec<HighDemandItem>> {
        let mut items = Vec::new();
        for p in self.store.all_products().await? {
            let recent = self.store.latest_two(&p.product_id).await?;
            if recent.len() < 2 {
                continue;
            }
            let (Some(cur), Some(prev)) = (recent[0].stock, recent[1].stock) else {
                continue;
            };
            let delta = prev - cur;
            let floor = relative_floor(prev, self.thresholds.min_relative_fraction);
            if prev > 0 && delta >= self.thresholds.min_absolute_drop.max(floor) {
                items.push(HighDemandItem {
                    product_id: p.product_id,
                    name: p.name,
                    url: p.url,
                    stock: cur,
                    prev_stock: prev,
                    delta,
                    percent: percent_of(delta, prev),
                });
            }
        }
        items.sort_by(|a, b| b.delta.cmp(&a.delta));
        Ok(items)
    }

    /// Products that crossed into shortage during the short window:
    /// above the threshold at the window's oldest observation, at or
    /// below it at the newest. Most depleted first.
    pub async fn increased_shortage(&self) -> Result<Vec<IncreasedShortageItem>> {
        let cutoff = now_ts() - self.thresholds.short_window_days * SECS_PER_DAY;
        let threshold = self.thresholds.shortage_threshold;
        let mut items = Vec::new();
        for p in self.store.all_products().await? {
            let window = self.store.since(&p.product_id, cutoff).await?;
            let Some((first, last)) = window_endpoints(&window) else {
                continue;
            };
            if first > threshold && last <= threshold {
                items.push(IncreasedShortageItem {
                    product_id: p.product_id,
                    name: p.name,
                    url: p.url,
                    stock_then: first,
                    stock_now: last,
                    delta: last - first,
                });
            }
        }
        items.sort_by_key(|i| i.stock_now);
        Ok(items)
    }

    /// Windowed demand: stock dropped by at least `min_drop` units or
    /// 10% of the window-opening stock, whichever is larger.
    pub async fn increased_demand(&self) -> Result<Vec<IncreasedDemandItem>> {
        let cutoff = now_ts() - self.thresholds.short_window_days * SECS_PER_DAY;
        let mut items = Vec::new();
        for p in self.store.all_products().await? {
            let window = self.store.since(&p.product_id, cutoff).await?;
            let Some((first, last)) = window_endpoints(&window) else {
                continue;
            };
            let delta = first - last;
            if first > 0 && delta >= self.thresholds.min_drop.max(relative_floor(first, 0.10)) {
                items.push(IncreasedDemandItem {
                    product_id: p.product_id,
                    name: p.name,
                    url: p.url,
                    stock_then: first,
                    stock_now: last,
                    delta,
                    percent: percent_of(delta, first),
                });
            }
        }
        items.sort_by(|a, b| b.delta.cmp(&a.delta));
        Ok(items)
    }

    /// Units moved across the long window, best sellers first.
    /// `sold_pct` is None when the window opened at zero stock.
    pub async fn top_sellers(&self) -> Result<Vec<TopSellerItem>> {
        let cutoff = now_ts() - self.thresholds.long_window_days * SECS_PER_DAY;
        let mut items = Vec::new();
        for p in self.store.all_products().await? {
            let window = self.store.since(&p.product_id, cutoff).await?;
            let Some((first, last)) = window_endpoints(&window) else {
                continue;
            };
            let sold = first - last;
            if sold >= self.thresholds.min_sold {
                items.push(TopSellerItem {
                    product_id: p.product_id,
                    name: p.name,
                    url: p.url,
                    sold,
                    sold_pct: percent_of(sold, first),
                });
            }
        }
        items.sort_by(|a, b| b.sold.cmp(&a.sold));
        Ok(items)
    }
}

/// Oldest and newest stock inside a window, in time order. None when
/// the window is empty or either endpoint's stock is unknown; absence
/// from the window is never a signal.
fn window_endpoints(window: &[ObservationRow]) -> Option<(i64, i64)> {
    let first = window.first()?.stock?;
    let last = window.last()?.stock?;
    Some((first, last))
}

fn relative_floor(base: i64, fraction: f64) -> i64 {
    (base as f64 * fraction).floor() as i64
}

fn percent_of(delta: i64, base: i64) -> Option<i64> {
    if base == 0 {
        return None;
    }
    Some((delta as f64 / base as f64 * 100.0).round() as i64)
}
