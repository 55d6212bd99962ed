use std::str::FromStr;
use std::time::Duration;

use fundinfo_market_data::{DEFAULT_COMPOUNDING_FACTOR, DEFAULT_RATE_LIMIT_DELAY, DEFAULT_RETRY_COUNT};
use rust_decimal::Decimal;

/// Provider answering current and historical point rates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateSource {
    CryptoCompare,
    /// Current rates only; historical lookups fail as unsupported.
    AlphaVantage,
}

impl FromStr for RateSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cryptocompare" => Ok(Self::CryptoCompare),
            "alphavantage" | "alpha_vantage" => Ok(Self::AlphaVantage),
            other => Err(format!("unknown rate provider '{}'", other)),
        }
    }
}

pub struct Config {
    /// Point-rate provider name, parsed into a [`RateSource`] at start-up.
    pub rate_provider: String,
    pub cryptocompare_api_key: String,
    /// Overrides the CryptoCompare host, e.g. for a caching mirror.
    pub cryptocompare_base_url: Option<String>,
    pub alphavantage_api_key: String,
    pub retry_count: u32,
    pub rate_limit_delay: Duration,
    /// CUSDC -> USDC exchange factor.
    pub compounding_factor: Decimal,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let rate_provider =
            std::env::var("FUNDINFO_RATE_PROVIDER").unwrap_or_else(|_| "cryptocompare".into());
        let cryptocompare_api_key =
            std::env::var("FUNDINFO_CRYPTOCOMPARE_API_KEY").unwrap_or_default();
        let cryptocompare_base_url = std::env::var("FUNDINFO_CRYPTOCOMPARE_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());
        let alphavantage_api_key =
            std::env::var("FUNDINFO_ALPHAVANTAGE_API_KEY").unwrap_or_default();
        let retry_count: u32 = std::env::var("FUNDINFO_RETRY_COUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_RETRY_COUNT);
        let rate_limit_delay = std::env::var("FUNDINFO_RATE_LIMIT_DELAY_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RATE_LIMIT_DELAY);
        let compounding_factor = std::env::var("FUNDINFO_COMPOUNDING_FACTOR")
            .ok()
            .and_then(|v| Decimal::from_str(v.trim()).ok())
            .filter(|f| *f > Decimal::ZERO)
            .unwrap_or(DEFAULT_COMPOUNDING_FACTOR);
        let log_format = std::env::var("FUNDINFO_LOG_FORMAT").unwrap_or_else(|_| "text".into());
        Self {
            rate_provider,
            cryptocompare_api_key,
            cryptocompare_base_url,
            alphavantage_api_key,
            retry_count,
            rate_limit_delay,
            compounding_factor,
            log_format,
        }
    }
}
