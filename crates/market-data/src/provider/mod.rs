//! Rate provider abstractions and implementations.
//!
//! This module contains:
//! - The `RateProvider` trait that all providers implement
//! - Provider capabilities and rate limiting configuration
//! - Concrete HTTP providers (CryptoCompare, Alpha Vantage)
//!
//! Providers receive canonical symbols. Alias resolution and compounding
//! token adjustments happen in the resolver, not in the providers.

mod capabilities;
mod traits;

pub mod alpha_vantage;
pub mod crypto_compare;

// Re-exports
pub use capabilities::{ProviderCapabilities, RateLimit};
pub use traits::RateProvider;
