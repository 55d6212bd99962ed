//! Quote-currency conversion of fund returns and amounts.
//!
//! A fund's return in a quote currency compounds its native return with the
//! movement of the denomination against the quote over the same window:
//!
//! ```text
//! quote_return = (native + 1) * (current_rate / past_rate) - 1
//! ```
//!
//! Nothing here fails: unusable inputs produce `None`, which callers report
//! as an unknown value.

use fundinfo_market_data::Rate;
use rust_decimal::Decimal;

use super::constants::{MAX_NATIVE_RETURN, MIN_NATIVE_RETURN};

/// True when a native return is within the accepted sanity bounds.
pub fn is_plausible_return(native: Decimal) -> bool {
    (MIN_NATIVE_RETURN..=MAX_NATIVE_RETURN).contains(&native)
}

/// Convert a native return into the quote currency.
///
/// `current` and `past` are the denom-to-quote rates now and at the start of
/// the window.
pub fn convert_return(native: Option<Decimal>, current: Option<Rate>, past: Option<Rate>) -> Option<Decimal> {
    let native = native.filter(|r| is_plausible_return(*r))?;
    let currency_growth = current?.value().checked_div(past?.value())?;

    (native + Decimal::ONE)
        .checked_mul(currency_growth)
        .map(|growth| growth - Decimal::ONE)
}

/// Express a native amount in the quote currency.
pub fn convert_amount(value: Option<Decimal>, current: Option<Rate>) -> Option<Decimal> {
    value?.checked_mul(current?.value())
}
