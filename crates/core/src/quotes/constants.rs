//! Return conversion constants.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Largest native return accepted for conversion (+1000%).
pub const MAX_NATIVE_RETURN: Decimal = dec!(10);

/// Smallest native return accepted for conversion (-1000%).
pub const MIN_NATIVE_RETURN: Decimal = dec!(-10);
