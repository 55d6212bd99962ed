//! Quote module - funds priced in a chosen quote symbol.
//!
//! - [`converter`] - Return composition and amount conversion
//! - [`model`] - The quoted fund record
//! - [`service`] - Batch quoting through the rate resolver
//!
//! ```text
//! FundQuoteService → RateResolver (current + one rate per window)
//!        ↓
//!   converter → QuotedFund
//! ```

pub mod constants;
pub mod converter;
mod model;
mod service;

pub use constants::{MAX_NATIVE_RETURN, MIN_NATIVE_RETURN};
pub use converter::{convert_amount, convert_return, is_plausible_return};
pub use model::QuotedFund;
pub use service::FundQuoteService;
