use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::funds::ReturnWindow;

/// A fund with its valuation and returns expressed in a quote symbol.
///
/// Missing values mean "unknown", never zero.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotedFund {
    pub name: String,
    pub address: String,
    pub denom_symbol: String,
    pub quote_symbol: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub inception_timestamp: DateTime<Utc>,
    pub aum: Option<Decimal>,
    pub share_price: Option<Decimal>,
    pub returns: BTreeMap<ReturnWindow, Decimal>,
    pub platform_name: String,
    #[serde(rename = "platformURL")]
    pub platform_url: String,
}
