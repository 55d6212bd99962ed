use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::windows::{window_starts, ReturnWindow};

/// Native share prices reported by a fund source.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SharePrices {
    pub current: Option<Decimal>,
    /// Share price at the start of each window.
    #[serde(default)]
    pub past: BTreeMap<ReturnWindow, Decimal>,
}

/// Raw fund record as pushed by a discovery source.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewFund {
    pub name: String,
    pub address: String,
    pub denom_symbol: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub inception_timestamp: DateTime<Utc>,
    pub aum: Option<Decimal>,
    #[serde(default)]
    pub share_prices: SharePrices,
    pub platform_name: String,
    #[serde(rename = "platformURL")]
    pub platform_url: String,
}

/// Fund in its native denomination with returns computed per window.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Fund {
    pub name: String,
    pub address: String,
    pub denom_symbol: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub inception_timestamp: DateTime<Utc>,
    /// Only present when strictly positive.
    pub aum: Option<Decimal>,
    /// Only present when strictly positive.
    pub share_price: Option<Decimal>,
    pub returns: BTreeMap<ReturnWindow, Decimal>,
    /// Window start instants the returns were measured from.
    pub window_starts: BTreeMap<ReturnWindow, DateTime<Utc>>,
    pub platform_name: String,
    #[serde(rename = "platformURL")]
    pub platform_url: String,
}

impl Fund {
    /// Build a fund with windows measured back from `now`.
    pub fn new(new_fund: NewFund, now: DateTime<Utc>) -> Self {
        let aum = positive(new_fund.aum);
        if aum.is_none() {
            warn!(
                "No AUM for {} from {} {}",
                new_fund.name, new_fund.platform_name, new_fund.address
            );
        }

        let share_price = positive(new_fund.share_prices.current);
        if share_price.is_none() {
            warn!(
                "No share price for {} from {} {}",
                new_fund.name, new_fund.platform_name, new_fund.address
            );
        }

        let returns = ReturnWindow::ALL
            .into_iter()
            .filter_map(|window| {
                let past = new_fund.share_prices.past.get(&window).copied();
                native_return(new_fund.share_prices.current, past).map(|r| (window, r))
            })
            .collect();

        Self {
            window_starts: window_starts(now, new_fund.inception_timestamp),
            name: new_fund.name,
            address: new_fund.address,
            denom_symbol: new_fund.denom_symbol,
            inception_timestamp: new_fund.inception_timestamp,
            aum,
            share_price,
            returns,
            platform_name: new_fund.platform_name,
            platform_url: new_fund.platform_url,
        }
    }
}

impl From<NewFund> for Fund {
    fn from(new_fund: NewFund) -> Self {
        Fund::new(new_fund, Utc::now())
    }
}

fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| *v > Decimal::ZERO)
}

/// `current / past - 1`, when both prices are strictly positive.
pub fn native_return(current: Option<Decimal>, past: Option<Decimal>) -> Option<Decimal> {
    let current = positive(current)?;
    let past = positive(past)?;
    current.checked_div(past).map(|ratio| ratio - Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn new_fund(aum: Option<Decimal>, current: Option<Decimal>) -> NewFund {
        let mut past = BTreeMap::new();
        past.insert(ReturnWindow::LastDay, dec!(1.0));
        past.insert(ReturnWindow::LastWeek, dec!(0));
        past.insert(ReturnWindow::Inception, dec!(0.5));

        NewFund {
            name: "Alpha Fund".to_string(),
            address: "0xabc".to_string(),
            denom_symbol: "WETH".to_string(),
            inception_timestamp: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            aum,
            share_prices: SharePrices { current, past },
            platform_name: "Melon".to_string(),
            platform_url: "https://melon.fund".to_string(),
        }
    }

    #[test]
    fn test_native_returns() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let fund = Fund::new(new_fund(Some(dec!(250)), Some(dec!(1.1))), now);

        assert_eq!(fund.aum, Some(dec!(250)));
        assert_eq!(fund.share_price, Some(dec!(1.1)));
        assert_eq!(fund.returns[&ReturnWindow::LastDay], dec!(0.1));
        assert_eq!(fund.returns[&ReturnWindow::Inception], dec!(1.2));
        // zero past price and missing windows have no return
        assert!(!fund.returns.contains_key(&ReturnWindow::LastWeek));
        assert!(!fund.returns.contains_key(&ReturnWindow::LastMonth));
        assert_eq!(fund.window_starts.len(), 7);
    }

    #[test]
    fn test_non_positive_values_are_absent() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let fund = Fund::new(new_fund(Some(dec!(0)), Some(dec!(-1))), now);

        assert_eq!(fund.aum, None);
        assert_eq!(fund.share_price, None);
        assert!(fund.returns.is_empty());
    }

    #[test]
    fn test_native_return() {
        assert_eq!(native_return(Some(dec!(3)), Some(dec!(2))), Some(dec!(0.5)));
        assert_eq!(native_return(Some(dec!(3)), None), None);
        assert_eq!(native_return(None, Some(dec!(2))), None);
        assert_eq!(native_return(Some(dec!(3)), Some(dec!(0))), None);
    }

    #[test]
    fn test_deserialize_new_fund() {
        let json = r#"{
            "name": "Beta",
            "address": "0xdef",
            "denomSymbol": "DAI",
            "inceptionTimestamp": 1577836800,
            "aum": 1000.5,
            "sharePrices": {"current": 1.02, "past": {"lastMonth": 1.0}},
            "platformName": "TokenSets",
            "platformURL": "https://tokensets.com"
        }"#;
        let fund: NewFund = serde_json::from_str(json).unwrap();

        assert_eq!(fund.denom_symbol, "DAI");
        assert_eq!(fund.inception_timestamp.timestamp(), 1_577_836_800);
        assert_eq!(fund.share_prices.past[&ReturnWindow::LastMonth], dec!(1.0));
    }
}
