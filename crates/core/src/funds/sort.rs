//! Ordering of quoted funds for display.

use std::cmp::Ordering;
use std::str::FromStr;

use super::windows::ReturnWindow;
use crate::errors::Error;
use crate::quotes::QuotedFund;

/// Field to order funds by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Platform,
    Aum,
    SharePrice,
    Inception,
    Return(ReturnWindow),
}

impl FromStr for SortKey {
    type Err = Error;

    /// Accepts `name`, `platform`, `aum`, `sharePrice`, `inception` and
    /// `returns.<window>` (e.g. `returns.lastMonth`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(window) = s.strip_prefix("returns.") {
            return window.parse().map(SortKey::Return);
        }
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "platform" | "platformname" => Ok(SortKey::Platform),
            "aum" => Ok(SortKey::Aum),
            "shareprice" => Ok(SortKey::SharePrice),
            "inception" | "inceptiontimestamp" => Ok(SortKey::Inception),
            _ => Err(Error::Validation(format!("unknown sort key '{}'", s))),
        }
    }
}

fn compare(a: &QuotedFund, b: &QuotedFund, key: SortKey) -> Ordering {
    // Option orders None before Some, so absent values lead in ascending order.
    match key {
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Platform => a.platform_name.cmp(&b.platform_name),
        SortKey::Aum => a.aum.cmp(&b.aum),
        SortKey::SharePrice => a.share_price.cmp(&b.share_price),
        SortKey::Inception => a.inception_timestamp.cmp(&b.inception_timestamp),
        SortKey::Return(window) => a.returns.get(&window).cmp(&b.returns.get(&window)),
    }
}

/// Stable sort by `key`. Funds missing the value sort first when ascending
/// and last when descending.
pub fn sort_quoted_funds(funds: &mut [QuotedFund], key: SortKey, ascending: bool) {
    funds.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn quoted(name: &str, aum: Option<Decimal>, last_day: Option<Decimal>) -> QuotedFund {
        let mut returns = BTreeMap::new();
        if let Some(r) = last_day {
            returns.insert(ReturnWindow::LastDay, r);
        }
        QuotedFund {
            name: name.to_string(),
            address: String::new(),
            denom_symbol: "ETH".to_string(),
            quote_symbol: "USD".to_string(),
            inception_timestamp: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            aum,
            share_price: None,
            returns,
            platform_name: "Melon".to_string(),
            platform_url: String::new(),
        }
    }

    fn names(funds: &[QuotedFund]) -> Vec<&str> {
        funds.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_absent_values_first_when_ascending() {
        let mut funds = vec![
            quoted("b", Some(dec!(20)), None),
            quoted("a", None, None),
            quoted("c", Some(dec!(5)), None),
        ];

        sort_quoted_funds(&mut funds, SortKey::Aum, true);
        assert_eq!(names(&funds), vec!["a", "c", "b"]);

        sort_quoted_funds(&mut funds, SortKey::Aum, false);
        assert_eq!(names(&funds), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_sort_by_window_return() {
        let mut funds = vec![
            quoted("up", None, Some(dec!(0.2))),
            quoted("down", None, Some(dec!(-0.1))),
            quoted("unknown", None, None),
        ];

        sort_quoted_funds(&mut funds, SortKey::Return(ReturnWindow::LastDay), false);
        assert_eq!(names(&funds), vec!["up", "down", "unknown"]);
    }

    #[test]
    fn test_parse_sort_key() {
        assert_eq!("aum".parse::<SortKey>().unwrap(), SortKey::Aum);
        assert_eq!("sharePrice".parse::<SortKey>().unwrap(), SortKey::SharePrice);
        assert_eq!(
            "returns.last3Months".parse::<SortKey>().unwrap(),
            SortKey::Return(ReturnWindow::Last3Months)
        );
        assert!("volume".parse::<SortKey>().is_err());
    }
}
