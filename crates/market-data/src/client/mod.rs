//! Retrying, deduplicating wrapper around a rate provider.
//!
//! Every outbound call goes through three layers:
//! 1. capability check - unsupported operations fail without a request
//! 2. retry loop - rate-limited attempts sleep and try again
//! 3. deduplicator - identical concurrent attempts share one provider call,
//!    which takes a token from the provider's rate limiter before it runs

mod rate_limiter;

pub use rate_limiter::RateLimiter;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::dedupe::{CallDeduplicator, JobAborted};
use crate::errors::MarketDataError;
use crate::models::{Rate, RatePoint, Symbol};
use crate::provider::{ProviderCapabilities, RateProvider};

/// Default number of attempts per call.
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Default pause after a rate-limited attempt.
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(60);

/// Bounded retry policy for rate-limited calls.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub retry_count: u32,
    /// Pause between a rate-limited attempt and the next one.
    pub rate_limit_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_count: DEFAULT_RETRY_COUNT,
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
        }
    }
}

/// Identity of a provider call: the operation plus all of its arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum FetchJob {
    Current {
        denom: Symbol,
        quote: Symbol,
    },
    Historical {
        denom: Symbol,
        quote: Symbol,
        timestamp: DateTime<Utc>,
    },
    TimeSeries {
        denom: Symbol,
        quote: Symbol,
    },
}

impl FetchJob {
    fn operation(&self) -> &'static str {
        match self {
            Self::Current { .. } => "current",
            Self::Historical { .. } => "historical",
            Self::TimeSeries { .. } => "time_series",
        }
    }

    fn args(&self) -> String {
        match self {
            Self::Current { denom, quote } | Self::TimeSeries { denom, quote } => {
                format!("{}, {}", denom, quote)
            }
            Self::Historical {
                denom,
                quote,
                timestamp,
            } => format!("{}, {}, {}", denom, quote, timestamp.timestamp()),
        }
    }

    fn is_supported(&self, capabilities: &ProviderCapabilities) -> bool {
        match self {
            Self::Current { .. } => capabilities.supports_current,
            Self::Historical { .. } => capabilities.supports_historical,
            Self::TimeSeries { .. } => capabilities.supports_time_series,
        }
    }
}

type RateOutcome = Result<Rate, MarketDataError>;
type SeriesOutcome = Result<Arc<Vec<RatePoint>>, MarketDataError>;

/// Rate provider wrapped with throttling, deduplication and retries.
pub struct RateClient {
    provider: Arc<dyn RateProvider>,
    policy: RetryPolicy,
    limiter: Arc<RateLimiter>,
    rate_calls: CallDeduplicator<FetchJob, RateOutcome>,
    series_calls: CallDeduplicator<FetchJob, SeriesOutcome>,
}

impl RateClient {
    /// Wrap `provider` with the default retry policy.
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        Self::with_policy(provider, RetryPolicy::default())
    }

    /// Wrap `provider` with an explicit retry policy.
    pub fn with_policy(provider: Arc<dyn RateProvider>, policy: RetryPolicy) -> Self {
        let limiter = Arc::new(RateLimiter::new(provider.id(), &provider.rate_limit()));
        Self {
            provider,
            policy,
            limiter,
            rate_calls: CallDeduplicator::new(),
            series_calls: CallDeduplicator::new(),
        }
    }

    pub fn provider_id(&self) -> &'static str {
        self.provider.id()
    }

    pub fn capabilities(&self) -> ProviderCapabilities {
        self.provider.capabilities()
    }

    /// Latest rate of `denom` in `quote`.
    pub async fn fetch_current(&self, denom: &str, quote: &str) -> Result<Rate, MarketDataError> {
        let job = FetchJob::Current {
            denom: denom.to_string(),
            quote: quote.to_string(),
        };
        self.run_rate_job(job).await
    }

    /// Rate of `denom` in `quote` at `timestamp`.
    pub async fn fetch_historical(
        &self,
        denom: &str,
        quote: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Rate, MarketDataError> {
        let job = FetchJob::Historical {
            denom: denom.to_string(),
            quote: quote.to_string(),
            timestamp,
        };
        self.run_rate_job(job).await
    }

    /// Daily series of `denom` in `quote`.
    pub async fn fetch_time_series(
        &self,
        denom: &str,
        quote: &str,
    ) -> Result<Vec<RatePoint>, MarketDataError> {
        let job = FetchJob::TimeSeries {
            denom: denom.to_string(),
            quote: quote.to_string(),
        };
        self.ensure_supported(&job)?;

        let series = self
            .with_retry(&job, || {
                let provider = Arc::clone(&self.provider);
                let limiter = Arc::clone(&self.limiter);
                let (denom, quote) = (denom.to_string(), quote.to_string());
                self.series_calls.dedupe(job.clone(), move || async move {
                    limiter.acquire().await;
                    provider.fetch_time_series(&denom, &quote).await.map(Arc::new)
                })
            })
            .await?;

        Ok(series.as_ref().clone())
    }

    async fn run_rate_job(&self, job: FetchJob) -> Result<Rate, MarketDataError> {
        self.ensure_supported(&job)?;

        self.with_retry(&job, || {
            let provider = Arc::clone(&self.provider);
            let limiter = Arc::clone(&self.limiter);
            let call = job.clone();
            self.rate_calls.dedupe(job.clone(), move || async move {
                limiter.acquire().await;
                match call {
                    FetchJob::Current { denom, quote } => {
                        provider.fetch_current_rate(&denom, &quote).await
                    }
                    FetchJob::Historical {
                        denom,
                        quote,
                        timestamp,
                    } => provider.fetch_historical_rate(&denom, &quote, timestamp).await,
                    FetchJob::TimeSeries { .. } => Err(MarketDataError::Unsupported {
                        operation: "time_series".to_string(),
                        provider: provider.id().to_string(),
                    }),
                }
            })
        })
        .await
    }

    fn ensure_supported(&self, job: &FetchJob) -> Result<(), MarketDataError> {
        if job.is_supported(&self.provider.capabilities()) {
            Ok(())
        } else {
            Err(MarketDataError::Unsupported {
                operation: job.operation().to_string(),
                provider: self.provider.id().to_string(),
            })
        }
    }

    /// Run `attempt` until it stops being rate limited or attempts run out.
    /// An aborted background job counts as a terminal failure.
    async fn with_retry<T, F, Fut>(&self, job: &FetchJob, mut attempt: F) -> Result<T, MarketDataError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Result<T, MarketDataError>, JobAborted>>,
    {
        let attempts = self.policy.retry_count.max(1);

        for n in 1..=attempts {
            debug!(
                "{} {}({}) attempt {}/{}",
                self.provider.id(),
                job.operation(),
                job.args(),
                n,
                attempts
            );
            let outcome = attempt()
                .await
                .unwrap_or_else(|aborted| Err(MarketDataError::from(aborted)));
            match outcome {
                Err(e) if e.is_rate_limited() => {
                    if n < attempts {
                        warn!(
                            "{} rate limited on {}({}), retrying in {:?}",
                            self.provider.id(),
                            job.operation(),
                            job.args(),
                            self.policy.rate_limit_delay
                        );
                        tokio::time::sleep(self.policy.rate_limit_delay).await;
                    }
                }
                outcome => return outcome,
            }
        }

        Err(MarketDataError::PersistentlyRateLimited {
            provider: self.provider.id().to_string(),
            operation: job.operation().to_string(),
            args: job.args(),
            attempts,
        })
    }
}
