use std::fmt::Write;

use crate::config::REPORT_SECTION_LIMIT;
use crate::types::TrendReport;

/// Renders one analysis pass as Telegram-flavored HTML. Every numeric
/// extra is optional and empty sections render a "none detected" line —
/// the formatter never assumes a classification produced anything.
pub fn format_report(report: &TrendReport) -> String {
    let mut out = String::new();
    let ts = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC");
    let _ = writeln!(out, "Stock monitor report — {ts}\n");

    if report.high_demand.is_empty() {
        out.push_str("No high-demand products detected.\n");
    } else {
        out.push_str("<b>High demand (recent stock drops)</b>:\n");
        for item in report.high_demand.iter().take(REPORT_SECTION_LIMIT) {
            let mut extra = vec![format!("Δ{}", item.delta)];
            if let Some(pct) = item.percent {
                extra.push(format!("{pct}%"));
            }
            let _ = writeln!(
                out,
                "• {} — stock: {} ({})",
                link(&item.url, &item.name),
                item.stock,
                extra.join(", "),
            );
        }
    }

    if report.short_supply.is_empty() {
        out.push_str("\nNo short-supply products detected.\n");
    } else {
        out.push_str("\n<b>Short supply (low/none)</b>:\n");
        for item in report.short_supply.iter().take(REPORT_SECTION_LIMIT) {
            let _ = writeln!(out, "• {} — stock: {}", link(&item.url, &item.name), item.stock);
        }
    }

    if report.increased_shortage.is_empty() {
        out.push_str("\nNo new shortages in the window.\n");
    } else {
        out.push_str("\n<b>Increased shortage (crossed into low stock)</b>:\n");
        for item in report.increased_shortage.iter().take(REPORT_SECTION_LIMIT) {
            let _ = writeln!(
                out,
                "• {} — {} → {} (Δ{})",
                link(&item.url, &item.name),
                item.stock_then,
                item.stock_now,
                item.delta,
            );
        }
    }

    if report.increased_demand.is_empty() {
        out.push_str("\nNo demand surges in the window.\n");
    } else {
        out.push_str("\n<b>Increased demand (windowed drops)</b>:\n");
        for item in report.increased_demand.iter().take(REPORT_SECTION_LIMIT) {
            let mut extra = vec![format!("Δ{}", item.delta)];
            if let Some(pct) = item.percent {
                extra.push(format!("{pct}%"));
            }
            let _ = writeln!(
                out,
                "• {} — {} → {} ({})",
                link(&item.url, &item.name),
                item.stock_then,
                item.stock_now,
                extra.join(", "),
            );
        }
    }

    if report.top_sellers.is_empty() {
        out.push_str("\nNo top sellers in the window.\n");
    } else {
        out.push_str("\n<b>Top sellers</b>:\n");
        for item in report.top_sellers.iter().take(REPORT_SECTION_LIMIT) {
            let pct = item
                .sold_pct
                .map(|p| format!(" ({p}%)"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "• {} — sold {}{}",
                link(&item.url, &item.name),
                item.sold,
                pct,
            );
        }
    }

    out
}

fn link(url: &str, name: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape_attr(url), escape_html(name))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Attribute values additionally need quotes escaped or the href
/// terminates early.
fn escape_attr(text: &str) -> String {
    escape_html(text).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ShortSupplyItem, TopSellerItem};

    fn short(id: &str, stock: i64) -> ShortSupplyItem {
        ShortSupplyItem {
            product_id: id.to_string(),
            name: format!("Product {id}"),
            url: format!("https://e/{id}"),
            stock,
        }
    }

    #[test]
    fn empty_report_renders_all_placeholder_lines() {
        let text = format_report(&TrendReport::default());
        assert!(text.contains("No high-demand products detected."));
        assert!(text.contains("No short-supply products detected."));
        assert!(text.contains("No new shortages in the window."));
        assert!(text.contains("No demand surges in the window."));
        assert!(text.contains("No top sellers in the window."));
    }

    #[test]
    fn sections_are_capped() {
        let report = TrendReport {
            short_supply: (0..30).map(|i| short(&i.to_string(), i)).collect(),
            ..TrendReport::default()
        };
        let text = format_report(&report);
        assert_eq!(text.matches("— stock:").count(), REPORT_SECTION_LIMIT);
    }

    #[test]
    fn missing_percent_is_omitted_not_crashed() {
        let report = TrendReport {
            top_sellers: vec![TopSellerItem {
                product_id: "p".to_string(),
                name: "P".to_string(),
                url: "https://e/p".to_string(),
                sold: 5,
                sold_pct: None,
            }],
            ..TrendReport::default()
        };
        let text = format_report(&report);
        assert!(text.contains("sold 5\n"));
        assert!(!text.contains('%'));
    }

    #[test]
    fn urls_are_attribute_escaped() {
        let mut item = short("p", 1);
        item.url = "https://e/p?a=1&b=\"x\"".to_string();
        let report = TrendReport {
            short_supply: vec![item],
            ..TrendReport::default()
        };
        let text = format_report(&report);
        assert!(text.contains("href=\"https://e/p?a=1&amp;b=&quot;x&quot;\""));
    }

    #[test]
    fn names_are_html_escaped() {
        let mut item = short("p", 1);
        item.name = "Bits & <Bobs>".to_string();
        let report = TrendReport {
            short_supply: vec![item],
            ..TrendReport::default()
        };
        let text = format_report(&report);
        assert!(text.contains("Bits &amp; &lt;Bobs&gt;"));
    }
}
