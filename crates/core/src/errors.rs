//! Core error types for fund quoting.
//!
//! Rate failures keep their [`MarketDataError`] detail; everything that is
//! specific to funds lives here.

use fundinfo_market_data::MarketDataError;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the fund quoting layer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    /// None of the funds in a batch could be priced in the quote symbol.
    #[error("No prices found in {quote}")]
    NoPricesFound { quote: String },

    #[error("Fund source '{platform}' failed: {message}")]
    FundSource { platform: String, message: String },

    #[error("Input validation failed: {0}")]
    Validation(String),
}
