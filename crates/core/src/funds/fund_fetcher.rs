//! Dispatches every fund source concurrently.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{info, warn};

use super::funds_model::{Fund, NewFund};
use super::funds_traits::{FundSink, FundSource};

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_MAX_FUNDS: usize = 1000;

/// Runs a set of fund sources side by side.
pub struct FundFetcher {
    sources: Vec<Arc<dyn FundSource>>,
    batch_size: usize,
    max_funds: usize,
}

impl FundFetcher {
    pub fn new(sources: Vec<Arc<dyn FundSource>>) -> Self {
        Self::with_limits(sources, DEFAULT_BATCH_SIZE, DEFAULT_MAX_FUNDS)
    }

    pub fn with_limits(sources: Vec<Arc<dyn FundSource>>, batch_size: usize, max_funds: usize) -> Self {
        Self {
            sources,
            batch_size,
            max_funds,
        }
    }

    /// Run every source and wait for all of them. A failing source is logged
    /// and skipped. Returns the number of funds delivered to `sink`.
    pub async fn fetch_funds(&self, sink: FundSink) -> usize {
        let jobs = self.sources.iter().map(|source| {
            let sink = Arc::clone(&sink);
            async move {
                let result = source
                    .fetch_funds(self.batch_size, self.max_funds, sink)
                    .await;
                (source.platform_name().to_string(), result)
            }
        });

        let mut total = 0;
        for (platform, result) in join_all(jobs).await {
            match result {
                Ok(count) => {
                    info!("Fetched {} funds from {}", count, platform);
                    total += count;
                }
                Err(e) => warn!("Fund source {} failed: {}", platform, e),
            }
        }
        total
    }

    /// Fetch from every source and build funds with windows measured from `now`.
    pub async fn collect_funds(&self, now: DateTime<Utc>) -> Vec<Fund> {
        let funds = Arc::new(Mutex::new(Vec::new()));
        let collected = Arc::clone(&funds);
        let sink: FundSink = Arc::new(move |new_fund: NewFund| {
            let fund = Fund::new(new_fund, now);
            match collected.lock() {
                Ok(mut funds) => funds.push(fund),
                Err(poisoned) => poisoned.into_inner().push(fund),
            }
        });

        self.fetch_funds(sink).await;

        let mut guard = match funds.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::take(&mut *guard)
    }
}
