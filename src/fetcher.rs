use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::config::{FETCH_TIMEOUT_SECS, USER_AGENT};
use crate::error::Result;
use crate::types::RawProduct;

lazy_static! {
    static ref FIRST_NUMBER: Regex = Regex::new(r"(\d+)").unwrap();
    static ref ID_UNSAFE: Regex = Regex::new(r"[^0-9a-zA-Z_-]").unwrap();
}

#[derive(Debug, Default)]
pub struct IngestStats {
    pub sources_ok: usize,
    pub sources_failed: usize,
    /// Products discovered across all sources, before dedup.
    pub discovered: usize,
    pub unique: usize,
}

pub fn build_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Scrapes every configured listing page and returns one deduplicated
/// batch. A failed source logs a warning and contributes nothing;
/// it never aborts the other sources or the cycle.
pub async fn fetch_batch(
    client: &reqwest::Client,
    category_urls: &[String],
) -> (Vec<RawProduct>, IngestStats) {
    let mut stats = IngestStats::default();
    let mut batch = Vec::new();

    for url in category_urls {
        match fetch_listing(client, url).await {
            Ok(products) => {
                stats.sources_ok += 1;
                stats.discovered += products.len();
                batch.extend(products);
            }
            Err(e) => {
                stats.sources_failed += 1;
                warn!("Fetch failed for {url}: {e}");
            }
        }
    }

    let batch = dedupe_last_write_wins(batch);
    stats.unique = batch.len();
    (batch, stats)
}

/// Fetches one listing page and extracts its products.
pub async fn fetch_listing(client: &reqwest::Client, url: &str) -> Result<Vec<RawProduct>> {
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(parse_listing(&html, url))
}

/// Extracts products from listing HTML. Anchors whose href points at a
/// product page yield `(id, name, url, stock)`; stock is read from the
/// anchor's parent text, since listings put availability next to the link.
pub fn parse_listing(html: &str, base_url: &str) -> Vec<RawProduct> {
    let document = Html::parse_document(html);
    let mut products = Vec::new();

    let Ok(selector) = Selector::parse("a[href]") else {
        return products;
    };
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if !href.contains("/product/") && !href.contains("/p/") {
            continue;
        }
        let name = element.text().collect::<String>().trim().to_string();
        if name.is_empty() {
            continue;
        }
        let url = resolve_url(href, base_url);
        let stock = element
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|parent| normalize_stock(&parent.text().collect::<Vec<_>>().join(" ")));

        products.push(RawProduct {
            product_id: product_id_from_url(&url),
            name,
            url,
            stock,
        });
    }

    products
}

/// Best-effort stock reading from free listing text: first integer wins,
/// explicit out-of-stock wording maps to 0, anything else is unknown.
/// Unknown is None, never zero.
pub fn normalize_stock(text: &str) -> Option<i64> {
    if text.is_empty() {
        return None;
    }
    let text = text.replace('\u{a0}', " ");
    if let Some(m) = FIRST_NUMBER.captures(&text) {
        return m[1].parse::<i64>().ok();
    }
    let lower = text.to_lowercase();
    if lower.contains("нет") || lower.contains("sold out") || lower.contains("out of stock") {
        return Some(0);
    }
    None
}

/// Stable opaque key: the canonical URL with everything outside
/// `[0-9a-zA-Z_-]` collapsed to underscores.
pub fn product_id_from_url(url: &str) -> String {
    ID_UNSAFE.replace_all(url, "_").into_owned()
}

/// Last write wins per product id; first-seen order is preserved.
pub fn dedupe_last_write_wins(batch: Vec<RawProduct>) -> Vec<RawProduct> {
    let mut out: Vec<RawProduct> = Vec::with_capacity(batch.len());
    for product in batch {
        match out.iter_mut().find(|p| p.product_id == product.product_id) {
            Some(slot) => *slot = product,
            None => out.push(product),
        }
    }
    out
}

fn resolve_url(href: &str, base_url: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}
