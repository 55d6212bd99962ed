//! Rate provider trait definitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::MarketDataError;
use crate::models::{Rate, RatePoint};

use super::capabilities::{ProviderCapabilities, RateLimit};

/// Trait for exchange rate sources.
///
/// Symbols passed to a provider are already canonical (upper case, aliases
/// resolved). A provider reports throttling with
/// [`MarketDataError::RateLimited`]; everything else is treated as terminal by
/// the rate client.
///
/// Operations a provider does not implement keep the default body and must be
/// left out of [`capabilities`](Self::capabilities).
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use fundinfo_market_data::provider::{ProviderCapabilities, RateProvider};
///
/// struct FixedProvider;
///
/// #[async_trait]
/// impl RateProvider for FixedProvider {
///     fn id(&self) -> &'static str {
///         "FIXED"
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities {
///             supports_current: true,
///             supports_historical: false,
///             supports_time_series: false,
///         }
///     }
///
///     async fn fetch_current_rate(&self, _denom: &str, _quote: &str) -> Result<Rate, MarketDataError> {
///         Ok(Rate::ONE)
///     }
/// }
/// ```
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Unique identifier for this provider ("CRYPTOCOMPARE", "ALPHA_VANTAGE", ...).
    fn id(&self) -> &'static str;

    /// Describes which fetch operations are implemented.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Rate limiting configuration applied by the client before each call.
    fn rate_limit(&self) -> RateLimit {
        RateLimit::default()
    }

    /// Latest price of one unit of `denom` in `quote`.
    async fn fetch_current_rate(&self, denom: &str, quote: &str) -> Result<Rate, MarketDataError> {
        let _ = (denom, quote);
        Err(MarketDataError::Unsupported {
            operation: "current".to_string(),
            provider: self.id().to_string(),
        })
    }

    /// Price of one unit of `denom` in `quote` at `timestamp` (daily close).
    async fn fetch_historical_rate(
        &self,
        denom: &str,
        quote: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Rate, MarketDataError> {
        let _ = (denom, quote, timestamp);
        Err(MarketDataError::Unsupported {
            operation: "historical".to_string(),
            provider: self.id().to_string(),
        })
    }

    /// Daily closes for the pair, in whatever order the provider returns them.
    async fn fetch_time_series(
        &self,
        denom: &str,
        quote: &str,
    ) -> Result<Vec<RatePoint>, MarketDataError> {
        let _ = (denom, quote);
        Err(MarketDataError::Unsupported {
            operation: "time_series".to_string(),
            provider: self.id().to_string(),
        })
    }
}
