use crate::error::{AppError, Result};

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Fetch timeout for a single listing page (seconds).
pub const FETCH_TIMEOUT_SECS: u64 = 20;

/// User-Agent sent with listing requests.
pub const USER_AGENT: &str = "stock-monitor-bot/1.0";

/// Max items rendered per report section.
pub const REPORT_SECTION_LIMIT: usize = 15;

#[derive(Debug, Clone)]
pub struct Config {
    /// Listing pages to scrape each cycle (CATEGORY_URLS, comma-separated).
    pub category_urls: Vec<String>,
    pub log_level: String,
    pub db_path: String,
    /// Seconds between check cycles (CHECK_INTERVAL_SECS).
    pub check_interval_secs: u64,
    pub telegram_api_url: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub thresholds: Thresholds,
}

/// Numeric knobs for the trend engine. Explicit struct passed in at
/// construction — no call-site defaults, no globals.
#[derive(Debug, Clone)]
pub struct Thresholds {
    /// Stock at or below this counts as short supply (LOW_STOCK_THRESHOLD).
    pub low_stock_threshold: i64,
    /// Two-sample high demand: minimum absolute drop (MIN_ABSOLUTE_DROP).
    pub min_absolute_drop: i64,
    /// Two-sample high demand: minimum drop as a fraction of the older
    /// stock (MIN_RELATIVE_FRACTION).
    pub min_relative_fraction: f64,
    /// Windowed shortage crossing threshold (SHORTAGE_THRESHOLD).
    pub shortage_threshold: i64,
    /// Window for shortage/demand classifications, days (SHORT_WINDOW_DAYS).
    pub short_window_days: i64,
    /// Window for top-seller classification, days (LONG_WINDOW_DAYS).
    pub long_window_days: i64,
    /// Windowed demand: minimum absolute drop (MIN_DROP).
    pub min_drop: i64,
    /// Top sellers: minimum units sold over the window (MIN_SOLD).
    pub min_sold: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low_stock_threshold: 5,
            min_absolute_drop: 3,
            min_relative_fraction: 0.10,
            shortage_threshold: 5,
            short_window_days: 3,
            long_window_days: 7,
            min_drop: 5,
            min_sold: 5,
        }
    }
}

impl Thresholds {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let t = Self {
            low_stock_threshold: env_i64("LOW_STOCK_THRESHOLD", d.low_stock_threshold)?,
            min_absolute_drop: env_i64("MIN_ABSOLUTE_DROP", d.min_absolute_drop)?,
            min_relative_fraction: env_f64("MIN_RELATIVE_FRACTION", d.min_relative_fraction)?,
            shortage_threshold: env_i64("SHORTAGE_THRESHOLD", d.shortage_threshold)?,
            short_window_days: env_i64("SHORT_WINDOW_DAYS", d.short_window_days)?,
            long_window_days: env_i64("LONG_WINDOW_DAYS", d.long_window_days)?,
            min_drop: env_i64("MIN_DROP", d.min_drop)?,
            min_sold: env_i64("MIN_SOLD", d.min_sold)?,
        };
        t.validate()?;
        Ok(t)
    }

    /// Rejects malformed values at startup rather than mid-cycle.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("LOW_STOCK_THRESHOLD", self.low_stock_threshold),
            ("MIN_ABSOLUTE_DROP", self.min_absolute_drop),
            ("SHORTAGE_THRESHOLD", self.shortage_threshold),
            ("MIN_DROP", self.min_drop),
            ("MIN_SOLD", self.min_sold),
        ] {
            if value < 0 {
                return Err(AppError::Config(format!("{name} must be >= 0, got {value}")));
            }
        }
        for (name, value) in [
            ("SHORT_WINDOW_DAYS", self.short_window_days),
            ("LONG_WINDOW_DAYS", self.long_window_days),
        ] {
            if value <= 0 {
                return Err(AppError::Config(format!("{name} must be > 0, got {value}")));
            }
        }
        if !(0.0..=1.0).contains(&self.min_relative_fraction) {
            return Err(AppError::Config(format!(
                "MIN_RELATIVE_FRACTION must be within 0.0..=1.0, got {}",
                self.min_relative_fraction
            )));
        }
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let telegram_bot_token = std::env::var("TELEGRAM_BOT_TOKEN").map_err(|_| {
            AppError::Config("TELEGRAM_BOT_TOKEN must be set".to_string())
        })?;
        let telegram_chat_id = std::env::var("TELEGRAM_CHAT_ID").map_err(|_| {
            AppError::Config("TELEGRAM_CHAT_ID must be set".to_string())
        })?;

        let category_urls: Vec<String> = std::env::var("CATEGORY_URLS")
            .unwrap_or_else(|_| "https://uzum.uz/".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if category_urls.is_empty() {
            return Err(AppError::Config(
                "CATEGORY_URLS must name at least one listing page".to_string(),
            ));
        }

        Ok(Self {
            category_urls,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "stock_monitor.db".to_string()),
            check_interval_secs: {
                let secs = env_i64("CHECK_INTERVAL_SECS", 1800)?;
                if secs <= 0 {
                    return Err(AppError::Config(format!(
                        "CHECK_INTERVAL_SECS must be > 0, got {secs}"
                    )));
                }
                secs as u64
            },
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| TELEGRAM_API_URL.to_string()),
            telegram_bot_token,
            telegram_chat_id,
            thresholds: Thresholds::from_env()?,
        })
    }
}

fn env_i64(name: &str, default: i64) -> Result<i64> {
    match std::env::var(name) {
        Ok(v) => v
            .parse::<i64>()
            .map_err(|_| AppError::Config(format!("{name} must be an integer, got {v:?}"))),
        Err(_) => Ok(default),
    }
}

fn env_f64(name: &str, default: f64) -> Result<f64> {
    match std::env::var(name) {
        Ok(v) => v
            .parse::<f64>()
            .map_err(|_| AppError::Config(format!("{name} must be a number, got {v:?}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Thresholds::default().validate().is_ok());
    }

    #[test]
    fn negative_threshold_rejected() {
        let t = Thresholds {
            low_stock_threshold: -1,
            ..Thresholds::default()
        };
        assert!(matches!(t.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn zero_window_rejected() {
        let t = Thresholds {
            short_window_days: 0,
            ..Thresholds::default()
        };
        assert!(matches!(t.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn zero_check_interval_rejected_at_startup() {
        // A zero period would blow up the driver's interval timer, so it
        // must be refused here, not mid-startup.
        std::env::set_var("TELEGRAM_BOT_TOKEN", "t");
        std::env::set_var("TELEGRAM_CHAT_ID", "c");
        std::env::set_var("CHECK_INTERVAL_SECS", "0");
        let result = Config::from_env();
        std::env::remove_var("CHECK_INTERVAL_SECS");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn fraction_out_of_range_rejected() {
        let t = Thresholds {
            min_relative_fraction: 1.5,
            ..Thresholds::default()
        };
        assert!(matches!(t.validate(), Err(AppError::Config(_))));
    }
}
