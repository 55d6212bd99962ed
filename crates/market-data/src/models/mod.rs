//! Rate data models
//!
//! - `types` - The `Symbol` alias
//! - `rate` - The validated `Rate` value and its validity predicate
//! - `series` - Daily time-series points
//! - `symbols` - Alias, stablecoin and compounding-token tables

mod rate;
mod series;
mod symbols;
mod types;

pub use rate::{is_finite_and_positive, InvalidRate, Rate};
pub use series::RatePoint;
pub use symbols::{CompoundingToken, NormalizedSymbol, SymbolTable, DEFAULT_COMPOUNDING_FACTOR, USD};
pub use types::Symbol;
