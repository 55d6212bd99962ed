//! CryptoCompare rate provider implementation.
//!
//! This module provides exchange rates from the CryptoCompare min-api:
//! - Current rates via `/data/price`
//! - Historical daily closes via `/data/pricehistorical`
//!
//! CryptoCompare has no time-series endpoint wired up here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::Rate;
use crate::provider::{ProviderCapabilities, RateLimit, RateProvider};

const BASE_URL: &str = "https://min-api.cryptocompare.com/data";
const PROVIDER_ID: &str = "CRYPTOCOMPARE";

/// CryptoCompare rate provider.
pub struct CryptoCompareProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

/// Error envelope. Successful responses carry neither field.
#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(rename = "Response")]
    response: Option<String>,
    #[serde(rename = "Message")]
    message: Option<String>,
}

impl CryptoCompareProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL.to_string())
    }

    /// Point the provider at another host (used by proxies and local mirrors).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            base_url,
        }
    }

    /// Make a request against `endpoint` and return the raw body.
    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("api_key", &self.api_key));

        let endpoint_url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        let url = reqwest::Url::parse_with_params(&endpoint_url, &all_params).map_err(|e| {
            MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to build URL: {}", e),
            }
        })?;

        debug!(
            "CryptoCompare request: {}",
            mask_key(url.as_str(), &self.api_key)
        );

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if !status.is_success() {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        response
            .text()
            .await
            .map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            })
    }

    fn parse_body(text: &str) -> Result<Value, MarketDataError> {
        let body: Value = serde_json::from_str(text).map_err(|e| MarketDataError::InvalidData {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse response: {}", e),
        })?;

        let status: ApiStatus =
            serde_json::from_value(body.clone()).unwrap_or(ApiStatus {
                response: None,
                message: None,
            });
        Self::check_api_error(&status)?;

        Ok(body)
    }

    /// Check for the `"Response": "Error"` envelope.
    fn check_api_error(status: &ApiStatus) -> Result<(), MarketDataError> {
        if status.response.as_deref() != Some("Error") {
            return Ok(());
        }

        let message = status.message.clone().unwrap_or_default();
        if message.to_lowercase().contains("rate limit") {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        Err(MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message,
        })
    }

    /// Read a numeric field as a rate. Numbers are converted through their
    /// textual form so no precision is lost on the way to `Decimal`.
    /// JSON numbers are screened as floats first, then taken from their exact
    /// decimal text when it fits a `Decimal`.
    fn parse_rate(value: &Value, pair: &str) -> Result<Rate, MarketDataError> {
        let parsed = match value {
            Value::Number(n) => Rate::from_f64(n.as_f64().unwrap_or(f64::NAN))
                .map(|approx| n.to_string().parse::<Rate>().unwrap_or(approx)),
            Value::String(s) => s.parse::<Rate>(),
            other => other.to_string().parse::<Rate>(),
        };
        parsed.map_err(|e| MarketDataError::InvalidData {
            provider: PROVIDER_ID.to_string(),
            message: format!("{} {}", pair, e),
        })
    }

    /// `{"USD": 1800.5}`
    fn parse_current(text: &str, denom: &str, quote: &str) -> Result<Rate, MarketDataError> {
        let body = Self::parse_body(text)?;
        let pair = format!("{}/{}", denom, quote);
        let prices: HashMap<String, Value> = serde_json::from_value(body).unwrap_or_default();

        match prices.get(quote) {
            Some(value) => Self::parse_rate(value, &pair),
            None => Err(MarketDataError::RateNotFound(pair)),
        }
    }

    /// `{"ETH": {"USD": 1800.5}}`
    fn parse_historical(text: &str, denom: &str, quote: &str) -> Result<Rate, MarketDataError> {
        let body = Self::parse_body(text)?;
        let pair = format!("{}/{}", denom, quote);

        match body.get(denom).and_then(|prices| prices.get(quote)) {
            Some(value) => Self::parse_rate(value, &pair),
            None => Err(MarketDataError::RateNotFound(pair)),
        }
    }
}

/// Hide the API key in anything that ends up in logs.
fn mask_key(text: &str, api_key: &str) -> String {
    if api_key.is_empty() {
        text.to_string()
    } else {
        text.replace(api_key, "***")
    }
}

#[async_trait]
impl RateProvider for CryptoCompareProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_current: true,
            supports_historical: true,
            supports_time_series: false,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 50,
            burst: 10,
        }
    }

    async fn fetch_current_rate(&self, denom: &str, quote: &str) -> Result<Rate, MarketDataError> {
        debug!("Fetching current rate for {}/{} from CryptoCompare", denom, quote);
        let text = self
            .fetch("price", &[("fsym", denom), ("tsyms", quote)])
            .await?;
        Self::parse_current(&text, denom, quote)
    }

    async fn fetch_historical_rate(
        &self,
        denom: &str,
        quote: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Rate, MarketDataError> {
        debug!(
            "Fetching historical rate for {}/{} at {} from CryptoCompare",
            denom,
            quote,
            timestamp.timestamp()
        );
        let ts = timestamp.timestamp().to_string();
        let text = self
            .fetch(
                "pricehistorical",
                &[("fsym", denom), ("tsyms", quote), ("ts", &ts)],
            )
            .await?;
        Self::parse_historical(&text, denom, quote)
    }
}
