//! Number formatting for terminal output.

use rust_decimal::{Decimal, RoundingStrategy};

/// 1e-8. Values below this print as `0`.
const DISPLAY_FLOOR: Decimal = Decimal::from_parts(1, 0, 0, false, 8);

/// Up to two decimals, or two significant decimals after leading zeros for
/// values below one. Absent values print as `--`.
pub fn format_number(value: Option<Decimal>) -> String {
    let Some(value) = value else {
        return "--".to_string();
    };
    if value < DISPLAY_FLOOR {
        return "0".to_string();
    }

    let plain = value.normalize().to_string();
    let (int, dec) = match plain.split_once('.') {
        Some((int, dec)) => (int, dec),
        None => return with_commas(&plain),
    };

    let first_non_zero = dec.find(|c| c != '0').unwrap_or(dec.len());
    if int != "0" {
        if first_non_zero > 1 {
            return with_commas(int);
        }
        let kept = &dec[..dec.len().min(2)];
        return with_commas(&format!("{}.{}", int, kept));
    }

    let kept = &dec[..dec.len().min(first_non_zero + 2)];
    with_commas(&format!("{}.{}", int, kept))
}

/// Ratio as a percentage with two decimals, e.g. `0.2134` -> `21.34%`.
pub fn format_percentage(ratio: Option<Decimal>) -> String {
    match ratio {
        Some(ratio) => {
            let pct = (ratio * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("{}%", with_commas(&format!("{:.2}", pct)))
        }
        None => "--".to_string(),
    }
}

/// Insert thousands separators into the integer part.
fn with_commas(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac {
        Some(frac) if !frac.is_empty() => format!("{}{}.{}", sign, grouped, frac),
        _ => format!("{}{}", sign, grouped),
    }
}
