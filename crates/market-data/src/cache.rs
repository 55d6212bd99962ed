//! Day-bucketed in-memory rate cache.
//!
//! Each calendar day holds `quote -> denom -> rate`, where the rate is the
//! price of one unit of `denom` expressed in `quote`. Lookups try the direct
//! entry, then the inverse, then a two-hop path through a shared pivot quote.
//! Entries are never evicted or overwritten.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use log::{debug, warn};

use crate::models::{Rate, Symbol};

/// All rates recorded for one day.
#[derive(Debug, Default)]
struct DayRates {
    /// Quote symbols in the order they were first written. Pivot search
    /// walks this list so the first matching pivot is deterministic.
    quotes: Vec<Symbol>,
    rates: HashMap<Symbol, HashMap<Symbol, Rate>>,
}

impl DayRates {
    fn get(&self, denom: &str, quote: &str) -> Option<Rate> {
        self.rates.get(quote).and_then(|by_denom| by_denom.get(denom)).copied()
    }

    fn lookup(&self, denom: &str, quote: &str) -> Option<Rate> {
        if let Some(rate) = self.get(denom, quote) {
            return Some(rate);
        }

        if let Some(inverse) = self.get(quote, denom).and_then(Rate::inverse) {
            return Some(inverse);
        }

        self.quotes.iter().find_map(|pivot| {
            let by_denom = self.rates.get(pivot)?;
            let denom_in_pivot = by_denom.get(denom)?;
            let quote_in_pivot = by_denom.get(quote)?;
            denom_in_pivot.checked_div(*quote_in_pivot)
        })
    }

    /// Returns false when the slot was already taken.
    fn store(&mut self, rate: Rate, denom: &str, quote: &str) -> bool {
        if !self.rates.contains_key(quote) {
            self.quotes.push(quote.to_string());
        }
        let by_denom = self.rates.entry(quote.to_string()).or_default();
        if by_denom.contains_key(denom) {
            return false;
        }
        by_denom.insert(denom.to_string(), rate);
        true
    }
}

/// Thread-safe rate cache shared by a resolver and its callers.
#[derive(Debug, Default)]
pub struct RateCache {
    days: Mutex<HashMap<NaiveDate, DayRates>>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the day map, recovering from poison if necessary.
    fn lock_days(&self) -> MutexGuard<'_, HashMap<NaiveDate, DayRates>> {
        self.days.lock().unwrap_or_else(|poisoned| {
            warn!("Rate cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Price of one `denom` in `quote` on `date`, if it can be derived from
    /// what was stored that day.
    pub fn lookup(&self, denom: &str, quote: &str, date: NaiveDate) -> Option<Rate> {
        self.lock_days()
            .get(&date)
            .and_then(|day| day.lookup(denom, quote))
    }

    /// Record `rate` for `(date, quote, denom)`. The first value written for a
    /// slot wins; later writes are ignored.
    pub fn store(&self, rate: Rate, denom: &str, quote: &str, date: NaiveDate) {
        let stored = self
            .lock_days()
            .entry(date)
            .or_default()
            .store(rate, denom, quote);

        if stored {
            debug!("Cached {}/{} = {} on {}", denom, quote, rate, date);
        } else {
            debug!("Kept existing {}/{} on {}", denom, quote, date);
        }
    }

    /// Number of days with at least one entry.
    #[cfg(test)]
    pub(crate) fn days(&self) -> usize {
        self.lock_days().len()
    }
}
