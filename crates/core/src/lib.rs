//! Fundinfo Core - fund models, return windows and quote-currency conversion.
//!
//! Funds arrive from discovery sources in their native denomination. This
//! crate computes native returns per lookback window and converts returns,
//! AUM and share prices into a quote symbol using rates from
//! [`fundinfo_market_data::RateResolver`].

pub mod errors;
pub mod funds;
pub mod quotes;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
