use std::sync::Arc;

use async_trait::async_trait;

use super::funds_model::NewFund;
use crate::errors::Result;

/// Callback through which a source delivers funds as soon as each one is ready.
pub type FundSink = Arc<dyn Fn(NewFund) + Send + Sync>;

/// A fund discovery platform.
///
/// Implementations page through their platform `batch_size` funds at a time,
/// stop after `max_funds`, and push every fund into `sink`. The returned
/// count is the number of funds delivered.
#[async_trait]
pub trait FundSource: Send + Sync {
    fn platform_name(&self) -> &str;

    async fn fetch_funds(&self, batch_size: usize, max_funds: usize, sink: FundSink) -> Result<usize>;
}
