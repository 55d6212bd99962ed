//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all rate operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

use crate::dedupe::JobAborted;

/// Errors that can occur while resolving exchange rates.
///
/// The type is `Clone` because a single in-flight provider call may be shared
/// by many concurrent callers, each of which receives its own copy of the
/// outcome.
#[derive(Error, Debug, Clone)]
pub enum MarketDataError {
    /// No rate could be produced for the pair, even after the USD proxy
    /// fallback. Carries the failure of the original lookup.
    #[error("No rate found for {denom}/{quote}: {cause}")]
    NotFound {
        denom: String,
        quote: String,
        #[source]
        cause: Box<MarketDataError>,
    },

    /// The provider answered but had no rate for the pair.
    #[error("Rate not found: {0}")]
    RateNotFound(String),

    /// The provider rate limited the request (HTTP 429 or an API notice).
    /// Handled inside the rate client; never surfaces to callers.
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// Every attempt allowed by the retry policy was rate limited.
    #[error("Persistently rate limited: {provider} {operation}({args}) after {attempts} attempts")]
    PersistentlyRateLimited {
        provider: String,
        operation: String,
        args: String,
        attempts: u32,
    },

    /// The provider returned a zero, negative or non-finite value, or a
    /// payload that could not be parsed.
    #[error("Invalid data from {provider}: {message}")]
    InvalidData {
        provider: String,
        message: String,
    },

    /// The provider has no fetcher for the requested operation.
    #[error("Operation '{operation}' not supported by {provider}")]
    Unsupported {
        operation: String,
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The background task running a provider call panicked or was
    /// cancelled by runtime shutdown.
    #[error("Aborted: {0}")]
    Aborted(String),

    /// A provider-specific or transport error occurred.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },
}

impl From<JobAborted> for MarketDataError {
    fn from(aborted: JobAborted) -> Self {
        Self::Aborted(aborted.to_string())
    }
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use fundinfo_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "CRYPTOCOMPARE".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::RateNotFound("XYZ/USD".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. } => RetryClass::WithBackoff,

            Self::NotFound { .. }
            | Self::RateNotFound(_)
            | Self::PersistentlyRateLimited { .. }
            | Self::InvalidData { .. }
            | Self::Unsupported { .. }
            | Self::Timeout { .. }
            | Self::Aborted(_)
            | Self::ProviderError { .. } => RetryClass::Never,
        }
    }

    /// True for the transient rate-limit signal.
    pub fn is_rate_limited(&self) -> bool {
        self.retry_class() == RetryClass::WithBackoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_retries_with_backoff() {
        let error = MarketDataError::RateLimited {
            provider: "ALPHA_VANTAGE".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
        assert!(error.is_rate_limited());
    }

    #[test]
    fn test_persistent_rate_limit_never_retries() {
        let error = MarketDataError::PersistentlyRateLimited {
            provider: "CRYPTOCOMPARE".to_string(),
            operation: "current".to_string(),
            args: "ETH, USD".to_string(),
            attempts: 3,
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_terminal_errors_never_retry() {
        let errors = [
            MarketDataError::RateNotFound("XYZ/USD".to_string()),
            MarketDataError::InvalidData {
                provider: "TEST".to_string(),
                message: "rate 0".to_string(),
            },
            MarketDataError::Unsupported {
                operation: "time_series".to_string(),
                provider: "TEST".to_string(),
            },
            MarketDataError::Timeout {
                provider: "TEST".to_string(),
            },
            MarketDataError::Aborted("task panicked".to_string()),
        ];
        for error in errors {
            assert_eq!(error.retry_class(), RetryClass::Never, "{error}");
        }
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::RateLimited {
            provider: "CRYPTOCOMPARE".to_string(),
        };
        assert_eq!(format!("{}", error), "Rate limited: CRYPTOCOMPARE");

        let error = MarketDataError::NotFound {
            denom: "XYZ".to_string(),
            quote: "USD".to_string(),
            cause: Box::new(MarketDataError::RateNotFound("XYZ/USD".to_string())),
        };
        assert_eq!(
            format!("{}", error),
            "No rate found for XYZ/USD: Rate not found: XYZ/USD"
        );
    }
}
