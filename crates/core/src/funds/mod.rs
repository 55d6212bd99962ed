//! Funds module - raw fund records, native returns, discovery and ordering.

mod fund_fetcher;
mod funds_model;
mod funds_traits;
mod sort;
mod windows;

pub use fund_fetcher::{FundFetcher, DEFAULT_BATCH_SIZE, DEFAULT_MAX_FUNDS};
pub use funds_model::{native_return, Fund, NewFund, SharePrices};
pub use funds_traits::{FundSink, FundSource};
pub use sort::{sort_quoted_funds, SortKey};
pub use windows::{window_starts, window_timestamps, ReturnWindow};
