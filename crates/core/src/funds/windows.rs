//! Lookback windows over which fund returns are measured.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// A named lookback interval ending now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReturnWindow {
    LastDay,
    LastWeek,
    LastMonth,
    Last3Months,
    /// Since 1 January 00:00 UTC of the current year.
    YearStart,
    LastYear,
    /// Since the fund's inception timestamp.
    Inception,
}

impl ReturnWindow {
    pub const ALL: [ReturnWindow; 7] = [
        ReturnWindow::LastDay,
        ReturnWindow::LastWeek,
        ReturnWindow::LastMonth,
        ReturnWindow::Last3Months,
        ReturnWindow::YearStart,
        ReturnWindow::LastYear,
        ReturnWindow::Inception,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnWindow::LastDay => "lastDay",
            ReturnWindow::LastWeek => "lastWeek",
            ReturnWindow::LastMonth => "lastMonth",
            ReturnWindow::Last3Months => "last3Months",
            ReturnWindow::YearStart => "yearStart",
            ReturnWindow::LastYear => "lastYear",
            ReturnWindow::Inception => "inception",
        }
    }

    /// Instant the window starts at.
    pub fn start(&self, now: DateTime<Utc>, inception: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            ReturnWindow::LastDay => now - Duration::days(1),
            ReturnWindow::LastWeek => now - Duration::days(7),
            ReturnWindow::LastMonth => now - Duration::days(30),
            ReturnWindow::Last3Months => now - Duration::days(90),
            ReturnWindow::YearStart => NaiveDate::from_ymd_opt(now.year(), 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
                .unwrap_or(now),
            ReturnWindow::LastYear => now - Duration::days(365),
            ReturnWindow::Inception => inception,
        }
    }
}

impl fmt::Display for ReturnWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReturnWindow::ALL
            .into_iter()
            .find(|w| w.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation(format!("unknown return window '{}'", s)))
    }
}

/// Start instant of every window, relative to `now`.
pub fn window_starts(
    now: DateTime<Utc>,
    inception: DateTime<Utc>,
) -> BTreeMap<ReturnWindow, DateTime<Utc>> {
    ReturnWindow::ALL
        .into_iter()
        .map(|w| (w, w.start(now, inception)))
        .collect()
}

/// Start of every window as unix seconds.
pub fn window_timestamps(now: DateTime<Utc>, inception: DateTime<Utc>) -> BTreeMap<ReturnWindow, i64> {
    window_starts(now, inception)
        .into_iter()
        .map(|(w, start)| (w, start.timestamp()))
        .collect()
}
