//! Fundinfo Market Data Crate
//!
//! Resolves exchange rates between arbitrary asset symbols, now or at a
//! historical instant, on top of rate-limited third-party providers.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   RateResolver   |  (aliases, compounding factors, USD proxies)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |    RateCache     |  (day buckets: direct, inverse, pivot)
//! +------------------+
//!          | miss
//!          v
//! +------------------+
//! |    RateClient    |  (capability check, retry, dedupe, throttle)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |   RateProvider   |  (CryptoCompare, Alpha Vantage, ...)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Rate`] - Strictly positive exchange rate
//! - [`RatePoint`] - One day of a rate series
//! - [`SymbolTable`] - Alias, stablecoin and compounding-token tables
//! - [`MarketDataError`] - Error type shared by every layer

pub mod cache;
pub mod client;
pub mod dedupe;
pub mod errors;
pub mod models;
pub mod provider;
pub mod resolver;

pub use cache::RateCache;
pub use client::{RateClient, RetryPolicy, DEFAULT_RATE_LIMIT_DELAY, DEFAULT_RETRY_COUNT};
pub use dedupe::{CallDeduplicator, JobAborted};
pub use errors::{MarketDataError, RetryClass};
pub use models::{
    is_finite_and_positive, InvalidRate, Rate, RatePoint, Symbol, SymbolTable,
    DEFAULT_COMPOUNDING_FACTOR, USD,
};
pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::crypto_compare::CryptoCompareProvider;
pub use provider::{ProviderCapabilities, RateLimit, RateProvider};
pub use resolver::RateResolver;
