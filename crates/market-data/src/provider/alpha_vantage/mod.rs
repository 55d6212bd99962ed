//! Alpha Vantage rate provider implementation.
//!
//! This module provides exchange rates from the Alpha Vantage API:
//! - Current rates via the CURRENCY_EXCHANGE_RATE endpoint
//! - Daily crypto closes via the DIGITAL_CURRENCY_DAILY endpoint
//!
//! Note: Alpha Vantage free tier is limited to 5 API calls per minute.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::{Rate, RatePoint};
use crate::provider::{ProviderCapabilities, RateLimit, RateProvider};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";

/// Alpha Vantage rate provider.
///
/// Free tier is limited to 5 API calls per minute.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
}

// ============================================================================
// Response structures for Alpha Vantage API
// ============================================================================

/// CURRENCY_EXCHANGE_RATE response
#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    #[serde(rename = "Realtime Currency Exchange Rate")]
    exchange_rate: Option<ExchangeRateData>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExchangeRateData {
    #[serde(rename = "5. Exchange Rate")]
    rate: Option<String>,
}

/// DIGITAL_CURRENCY_DAILY response for cryptocurrencies
#[derive(Debug, Deserialize)]
struct CryptoDailyResponse {
    #[serde(rename = "Time Series (Digital Currency Daily)")]
    time_series: Option<HashMap<String, CryptoDailyQuote>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

/// Crypto daily quote with field names that embed the market currency,
/// e.g. `"4a. close (USD)"`.
#[derive(Debug, Deserialize)]
struct CryptoDailyQuote {
    #[serde(flatten)]
    fields: HashMap<String, serde_json::Value>,
}

impl CryptoDailyQuote {
    /// Close in the requested market, from `"4a. close (<market>)"`.
    fn get_close(&self, market: &str) -> Option<Rate> {
        let key = format!("4a. close ({})", market);
        self.fields
            .get(&key)
            .and_then(|value| value.as_str())
            .and_then(|s| s.parse::<Rate>().ok())
    }
}

fn is_rate_limit_notice(msg: &str) -> bool {
    msg.contains("call frequency") || msg.contains("rate limit")
}

// ============================================================================
// AlphaVantageProvider implementation
// ============================================================================

impl AlphaVantageProvider {
    /// Create a new Alpha Vantage provider with the given API key.
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, api_key }
    }

    /// Make a request to the Alpha Vantage API.
    async fn fetch(&self, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("apikey", &self.api_key));

        let url = reqwest::Url::parse_with_params(BASE_URL, &all_params).map_err(|e| {
            MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to build URL: {}", e),
            }
        })?;

        let logged_url = if self.api_key.is_empty() {
            url.as_str().to_string()
        } else {
            url.as_str().replace(&self.api_key, "***")
        };
        debug!("Alpha Vantage request: {}", logged_url);

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

    /// Check for API-level errors in the response.
    fn check_api_error(
        error_message: &Option<String>,
        note: &Option<String>,
        information: &Option<String>,
    ) -> Result<(), MarketDataError> {
        if let Some(ref msg) = error_message {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: msg.clone(),
            });
        }

        // "Note" usually indicates rate limiting
        if let Some(ref msg) = note {
            if is_rate_limit_notice(msg) {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            warn!("Alpha Vantage note: {}", msg);
        }

        if let Some(ref msg) = information {
            if is_rate_limit_notice(msg) {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            warn!("Alpha Vantage info: {}", msg);
        }

        Ok(())
    }

    fn parse_exchange_rate(text: &str, denom: &str, quote: &str) -> Result<Rate, MarketDataError> {
        let response: ExchangeRateResponse =
            serde_json::from_str(text).map_err(|e| MarketDataError::InvalidData {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse response: {}", e),
            })?;

        Self::check_api_error(
            &response.error_message,
            &response.note,
            &response.information,
        )?;

        let raw = response
            .exchange_rate
            .and_then(|data| data.rate)
            .ok_or_else(|| MarketDataError::RateNotFound(format!("{}/{}", denom, quote)))?;

        raw.parse::<Rate>().map_err(|e| MarketDataError::InvalidData {
            provider: PROVIDER_ID.to_string(),
            message: format!("{}/{} {}", denom, quote, e),
        })
    }

    /// Parse DIGITAL_CURRENCY_DAILY into ascending daily points. Days whose
    /// close is missing or not positive are skipped.
    fn parse_daily_series(
        text: &str,
        denom: &str,
        quote: &str,
    ) -> Result<Vec<RatePoint>, MarketDataError> {
        let response: CryptoDailyResponse =
            serde_json::from_str(text).map_err(|e| MarketDataError::InvalidData {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse response: {}", e),
            })?;

        Self::check_api_error(
            &response.error_message,
            &response.note,
            &response.information,
        )?;

        let time_series = response
            .time_series
            .ok_or_else(|| MarketDataError::RateNotFound(format!("{}/{}", denom, quote)))?;

        let mut points: Vec<RatePoint> = time_series
            .into_iter()
            .filter_map(|(date_str, daily)| {
                let date = Self::parse_date(&date_str)?;
                let rate = daily.get_close(quote)?;
                Some(RatePoint::new(date, rate))
            })
            .collect();

        if points.is_empty() {
            return Err(MarketDataError::RateNotFound(format!(
                "{}/{} (no daily closes)",
                denom, quote
            )));
        }

        points.sort_by_key(|p| p.date);
        Ok(points)
    }

    /// Parse a date string in YYYY-MM-DD format.
    fn parse_date(date_str: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()
    }
}

#[async_trait]
impl RateProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_current: true,
            supports_historical: false,
            supports_time_series: true,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 5, // Free tier is very limited
            burst: 1,
        }
    }

    async fn fetch_current_rate(&self, denom: &str, quote: &str) -> Result<Rate, MarketDataError> {
        debug!("Fetching current rate for {}/{} from Alpha Vantage", denom, quote);
        let params = [
            ("function", "CURRENCY_EXCHANGE_RATE"),
            ("from_currency", denom),
            ("to_currency", quote),
        ];
        let text = self.fetch(&params).await?;
        Self::parse_exchange_rate(&text, denom, quote)
    }

    async fn fetch_time_series(
        &self,
        denom: &str,
        quote: &str,
    ) -> Result<Vec<RatePoint>, MarketDataError> {
        debug!("Fetching time series for {}/{} from Alpha Vantage", denom, quote);
        let params = [
            ("function", "DIGITAL_CURRENCY_DAILY"),
            ("symbol", denom),
            ("market", quote),
        ];
        let text = self.fetch(&params).await?;
        let points = Self::parse_daily_series(&text, denom, quote)?;

        debug!(
            "Alpha Vantage: fetched {} daily rates for {}/{}",
            points.len(),
            denom,
            quote
        );
        Ok(points)
    }
}
