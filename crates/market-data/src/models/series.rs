use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::rate::Rate;

/// One daily close of a time series: `rate` units of quote per unit of denom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatePoint {
    pub date: NaiveDate,
    pub rate: Rate,
}

impl RatePoint {
    pub fn new(date: NaiveDate, rate: Rate) -> Self {
        Self { date, rate }
    }
}
