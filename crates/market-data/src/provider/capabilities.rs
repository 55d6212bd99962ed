//! Provider capabilities and rate limiting configuration.
//!
//! This module defines structures for describing which rate operations a
//! provider can serve and how it should be throttled.

/// Describes which fetch operations a rate provider implements.
///
/// The rate client consults this before calling the provider, so an
/// operation the provider lacks fails with `Unsupported` without any
/// network traffic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProviderCapabilities {
    /// Whether the provider can quote the latest rate.
    pub supports_current: bool,

    /// Whether the provider can quote a rate at a past instant.
    pub supports_historical: bool,

    /// Whether the provider can return a daily series for a pair.
    pub supports_time_series: bool,
}

/// Rate limiting configuration for a provider.
///
/// Controls how aggressively we can call a provider to avoid
/// hitting their rate limits and getting blocked.
#[derive(Clone, Debug)]
pub struct RateLimit {
    /// Maximum requests allowed per minute.
    pub requests_per_minute: u32,

    /// Requests that may be issued back to back before throttling starts.
    pub burst: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst: 5,
        }
    }
}
