//! Exchange rate resolution.
//!
//! The resolver is the single entry point for rates. It canonicalizes symbols,
//! applies compounding-token factors, serves from the day cache when it can
//! and otherwise asks the rate client, falling back to USD stablecoin proxies
//! when a direct USD quote is unavailable.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join;
use log::{debug, warn};
use rust_decimal::Decimal;
use tokio::task::JoinError;

use crate::cache::RateCache;
use crate::client::RateClient;
use crate::errors::MarketDataError;
use crate::models::{NormalizedSymbol, Rate, RatePoint, SymbolTable, USD};

/// Resolves rates between arbitrary symbols, now or at a past instant.
///
/// Construct once and share behind an `Arc`; all methods take `&self`.
/// Cache misses are resolved on a background task, so a caller that stops
/// waiting still leaves the fetched rate in the cache.
pub struct RateResolver {
    inner: Arc<ResolverState>,
}

struct ResolverState {
    symbols: SymbolTable,
    cache: RateCache,
    /// Current and historical point rates.
    rates: RateClient,
    /// Daily series used to back-fill the cache.
    series: RateClient,
}

impl RateResolver {
    pub fn new(rates: RateClient, series: RateClient, symbols: SymbolTable) -> Self {
        Self {
            inner: Arc::new(ResolverState {
                symbols,
                cache: RateCache::new(),
                rates,
                series,
            }),
        }
    }

    #[cfg(test)]
    pub(crate) fn cache(&self) -> &RateCache {
        &self.inner.cache
    }

    /// Price of one unit of `denom` in `quote`, at `at` or now.
    ///
    /// Historical lookups are bucketed by the UTC calendar day of `at`.
    pub async fn fetch_rate(
        &self,
        denom: &str,
        quote: &str,
        at: Option<DateTime<Utc>>,
    ) -> Result<Rate, MarketDataError> {
        let denom = self.inner.symbols.normalize(denom);
        let quote = self.inner.symbols.normalize(quote);
        let adjustment = adjustment(&denom, &quote)?;

        if denom.symbol == quote.symbol
            || (self.inner.symbols.is_usd_like(&denom.symbol)
                && self.inner.symbols.is_usd_like(&quote.symbol))
        {
            return apply(Rate::ONE, adjustment);
        }

        let date = at.unwrap_or_else(Utc::now).date_naive();
        if let Some(rate) = self.inner.cache.lookup(&denom.symbol, &quote.symbol, date) {
            debug!("Cache hit {}/{} on {}", denom.symbol, quote.symbol, date);
            return apply(rate, adjustment);
        }

        let state = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            state
                .resolve_and_store(&denom.symbol, &quote.symbol, at, date)
                .await
        });
        let rate = task.await.map_err(aborted)??;
        apply(rate, adjustment)
    }

    /// Daily series for the pair, written through to the cache.
    ///
    /// Identical concurrent requests share one provider call; the series
    /// itself is not memoized.
    pub async fn fetch_time_series(
        &self,
        denom: &str,
        quote: &str,
    ) -> Result<Vec<RatePoint>, MarketDataError> {
        let denom = self.inner.symbols.normalize(denom);
        let quote = self.inner.symbols.normalize(quote);
        let adjustment = adjustment(&denom, &quote)?;

        let state = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            state.back_fill_series(&denom.symbol, &quote.symbol).await
        });
        let points = task.await.map_err(aborted)??;

        points
            .into_iter()
            .map(|point| apply(point.rate, adjustment).map(|rate| RatePoint::new(point.date, rate)))
            .collect()
    }

    /// Resolve the rate on a given day, using midnight UTC as the instant.
    pub async fn fetch_rate_on(
        &self,
        denom: &str,
        quote: &str,
        date: NaiveDate,
    ) -> Result<Rate, MarketDataError> {
        let at = date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        self.fetch_rate(denom, quote, at).await
    }
}

impl ResolverState {
    /// Fetch a canonical pair the cache could not answer and store the result
    /// under `date`. Falls back to USD proxies when the quote is USD.
    async fn resolve_and_store(
        &self,
        denom: &str,
        quote: &str,
        at: Option<DateTime<Utc>>,
        date: NaiveDate,
    ) -> Result<Rate, MarketDataError> {
        let rate = match self.fetch_uncached(denom, quote, at).await {
            Ok(rate) => rate,
            Err(err) if quote == USD => {
                warn!(
                    "No direct {}/{} rate ({}), trying USD proxies",
                    denom, quote, err
                );
                self.fetch_via_usd_proxy(denom, at)
                    .await
                    .ok_or_else(|| MarketDataError::NotFound {
                        denom: denom.to_string(),
                        quote: quote.to_string(),
                        cause: Box::new(err),
                    })?
            }
            Err(err) => return Err(err),
        };

        self.cache.store(rate, denom, quote, date);
        Ok(rate)
    }

    /// Fetch the raw canonical series and back-fill every day into the cache.
    async fn back_fill_series(
        &self,
        denom: &str,
        quote: &str,
    ) -> Result<Vec<RatePoint>, MarketDataError> {
        let points = self.series.fetch_time_series(denom, quote).await?;

        for point in &points {
            self.cache.store(point.rate, denom, quote, point.date);
        }
        debug!(
            "Back-filled {} daily {}/{} rates",
            points.len(),
            denom,
            quote
        );
        Ok(points)
    }

    async fn fetch_uncached(
        &self,
        denom: &str,
        quote: &str,
        at: Option<DateTime<Utc>>,
    ) -> Result<Rate, MarketDataError> {
        match at {
            Some(timestamp) => self.rates.fetch_historical(denom, quote, timestamp).await,
            None => self.rates.fetch_current(denom, quote).await,
        }
    }

    /// Walk the stablecoin proxies in order and return the first complete
    /// `denom -> proxy -> USD` product.
    async fn fetch_via_usd_proxy(&self, denom: &str, at: Option<DateTime<Utc>>) -> Option<Rate> {
        for proxy in self.symbols.usd_proxies() {
            let (to_proxy, proxy_to_usd) = join(
                self.fetch_uncached(denom, proxy, at),
                self.fetch_uncached(proxy, USD, at),
            )
            .await;

            match (to_proxy, proxy_to_usd) {
                (Ok(a), Ok(b)) => match a.checked_mul(b) {
                    Some(rate) => {
                        debug!("Resolved {}/USD through {}", denom, proxy);
                        return Some(rate);
                    }
                    None => warn!("{}/USD through {} is out of range", denom, proxy),
                },
                (Err(e), _) | (_, Err(e)) => {
                    debug!("Proxy {} failed for {}: {}", proxy, denom, e);
                }
            }
        }
        None
    }
}

fn aborted(e: JoinError) -> MarketDataError {
    MarketDataError::Aborted(format!("rate resolution task: {}", e))
}

/// Multiplier for compounding tokens: scale up by the denom's factor and
/// down by the quote's.
fn adjustment(denom: &NormalizedSymbol, quote: &NormalizedSymbol) -> Result<Decimal, MarketDataError> {
    denom
        .factor
        .checked_div(quote.factor)
        .filter(|v| *v > Decimal::ZERO)
        .ok_or_else(|| MarketDataError::InvalidData {
            provider: "SYMBOL_TABLE".to_string(),
            message: format!(
                "invalid compounding factors {} / {}",
                denom.factor, quote.factor
            ),
        })
}

fn apply(rate: Rate, adjustment: Decimal) -> Result<Rate, MarketDataError> {
    rate.scale(adjustment)
        .ok_or_else(|| MarketDataError::InvalidData {
            provider: "SYMBOL_TABLE".to_string(),
            message: format!("{} x {} is out of range", rate, adjustment),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RetryPolicy;
    use crate::provider::{ProviderCapabilities, RateLimit, RateProvider};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// In-memory provider with a fixed table of pair prices.
    #[derive(Default)]
    struct TableProvider {
        prices: HashMap<(String, String), Rate>,
        series: Vec<RatePoint>,
        /// Extra latency on top of the base 10ms per call.
        delay: Duration,
        calls: Mutex<Vec<String>>,
    }

    impl TableProvider {
        fn with(mut self, denom: &str, quote: &str, value: Decimal) -> Self {
            self.prices
                .insert((denom.to_string(), quote.to_string()), Rate::new(value).unwrap());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn lookup(&self, op: &str, denom: &str, quote: &str) -> Result<Rate, MarketDataError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{} {}/{}", op, denom, quote));
            tokio::time::sleep(Duration::from_millis(10) + self.delay).await;
            self.prices
                .get(&(denom.to_string(), quote.to_string()))
                .copied()
                .ok_or_else(|| MarketDataError::RateNotFound(format!("{}/{}", denom, quote)))
        }
    }

    #[async_trait]
    impl RateProvider for TableProvider {
        fn id(&self) -> &'static str {
            "TABLE"
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities {
                supports_current: true,
                supports_historical: true,
                supports_time_series: true,
            }
        }

        fn rate_limit(&self) -> RateLimit {
            RateLimit {
                requests_per_minute: 60_000,
                burst: 100,
            }
        }

        async fn fetch_current_rate(&self, denom: &str, quote: &str) -> Result<Rate, MarketDataError> {
            self.lookup("current", denom, quote).await
        }

        async fn fetch_historical_rate(
            &self,
            denom: &str,
            quote: &str,
            _timestamp: DateTime<Utc>,
        ) -> Result<Rate, MarketDataError> {
            self.lookup("historical", denom, quote).await
        }

        async fn fetch_time_series(
            &self,
            denom: &str,
            quote: &str,
        ) -> Result<Vec<RatePoint>, MarketDataError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("series {}/{}", denom, quote));
            Ok(self.series.clone())
        }
    }

    fn resolver_with(provider: Arc<TableProvider>) -> RateResolver {
        let policy = RetryPolicy {
            retry_count: 3,
            rate_limit_delay: Duration::from_millis(1),
        };
        RateResolver::new(
            RateClient::with_policy(provider.clone(), policy.clone()),
            RateClient::with_policy(provider, policy),
            SymbolTable::new(),
        )
    }

    #[tokio::test]
    async fn test_concurrent_alias_requests_share_one_call() {
        let provider = Arc::new(TableProvider::default().with("ETH", "USD", dec!(1800)));
        let resolver = resolver_with(provider.clone());

        let results = futures::future::join_all(
            (0..5).map(|_| resolver.fetch_rate("WETH", "USD", None)),
        )
        .await;

        for result in results {
            assert_eq!(result.unwrap().value(), dec!(1800));
        }
        assert_eq!(provider.calls(), vec!["current ETH/USD".to_string()]);

        let cached = resolver.fetch_rate("ETH", "USD", None).await.unwrap();
        assert_eq!(cached.value(), dec!(1800));
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_stablecoins_are_unity_without_calls() {
        let provider = Arc::new(TableProvider::default());
        let resolver = resolver_with(provider.clone());

        assert_eq!(resolver.fetch_rate("USDC", "DAI", None).await.unwrap(), Rate::ONE);
        assert_eq!(resolver.fetch_rate("weth", "ETH", None).await.unwrap(), Rate::ONE);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_compounding_token_adjustment() {
        let provider = Arc::new(TableProvider::default().with("ETH", "USD", dec!(2000)));
        let resolver = resolver_with(provider.clone());

        let cusdc_in_usd = resolver.fetch_rate("CUSDC", "USD", None).await.unwrap();
        assert_eq!(cusdc_in_usd.value(), dec!(0.021));

        let eth_in_cusdc = resolver.fetch_rate("ETH", "CUSDC", None).await.unwrap();
        assert_eq!(eth_in_cusdc.value(), dec!(2000) * (dec!(1) / dec!(0.021)));
    }

    #[tokio::test]
    async fn test_usd_proxy_fallback_is_cached() {
        let provider = Arc::new(
            TableProvider::default()
                .with("MLN", "USDC", dec!(20))
                .with("USDC", "USD", dec!(1.01)),
        );
        let resolver = resolver_with(provider.clone());

        let rate = resolver.fetch_rate("MLN", "USD", None).await.unwrap();
        assert_eq!(rate.value(), dec!(20.20));

        let calls_after_first = provider.calls().len();
        let again = resolver.fetch_rate("MLN", "USD", None).await.unwrap();
        assert_eq!(again.value(), dec!(20.20));
        assert_eq!(provider.calls().len(), calls_after_first);
    }

    #[tokio::test]
    async fn test_proxies_exhausted_reports_original_failure() {
        let provider = Arc::new(TableProvider::default());
        let resolver = resolver_with(provider);

        let err = resolver.fetch_rate("XYZ", "USD", None).await.unwrap_err();
        match err {
            MarketDataError::NotFound { denom, quote, cause } => {
                assert_eq!(denom, "XYZ");
                assert_eq!(quote, "USD");
                assert!(matches!(*cause, MarketDataError::RateNotFound(ref pair) if pair == "XYZ/USD"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_usd_failure_propagates() {
        let provider = Arc::new(TableProvider::default());
        let resolver = resolver_with(provider.clone());

        let err = resolver.fetch_rate("XYZ", "ETH", None).await.unwrap_err();
        assert!(matches!(err, MarketDataError::RateNotFound(_)));
        assert_eq!(provider.calls(), vec!["current XYZ/ETH".to_string()]);
    }

    #[tokio::test]
    async fn test_historical_uses_day_bucket() {
        let provider = Arc::new(TableProvider::default().with("BTC", "USD", dec!(9000)));
        let resolver = resolver_with(provider.clone());
        let morning = DateTime::from_timestamp(1_577_869_200, 0).unwrap(); // 2020-01-01 09:00
        let evening = DateTime::from_timestamp(1_577_905_200, 0).unwrap(); // 2020-01-01 19:00

        resolver.fetch_rate("WBTC", "USD", Some(morning)).await.unwrap();
        let rate = resolver.fetch_rate("BTC", "USD", Some(evening)).await.unwrap();

        assert_eq!(rate.value(), dec!(9000));
        assert_eq!(provider.calls(), vec!["historical BTC/USD".to_string()]);
    }

    #[tokio::test]
    async fn test_time_series_back_fills_cache() {
        let day = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let provider = Arc::new(TableProvider {
            series: vec![
                RatePoint::new(day, Rate::new(dec!(2500)).unwrap()),
                RatePoint::new(day.succ_opt().unwrap(), Rate::new(dec!(2600)).unwrap()),
            ],
            ..TableProvider::default()
        });
        let resolver = resolver_with(provider.clone());

        let series = resolver.fetch_time_series("WETH", "USD").await.unwrap();
        assert_eq!(series.len(), 2);

        let rate = resolver.fetch_rate_on("ETH", "USD", day).await.unwrap();
        assert_eq!(rate.value(), dec!(2500));
        let inverse = resolver.fetch_rate_on("USD", "ETH", day).await.unwrap();
        assert_eq!(inverse.value(), dec!(1) / dec!(2500));
        assert_eq!(provider.calls(), vec!["series ETH/USD".to_string()]);
    }

    #[tokio::test]
    async fn test_abandoned_request_still_fills_cache() {
        let provider = Arc::new(TableProvider {
            delay: Duration::from_millis(100),
            ..TableProvider::default().with("ETH", "USD", dec!(1900))
        });
        let resolver = resolver_with(provider.clone());

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            resolver.fetch_rate("ETH", "USD", None),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;

        let today = Utc::now().date_naive();
        let cached = resolver.cache().lookup("ETH", "USD", today);
        assert_eq!(cached.map(Rate::value), Some(dec!(1900)));
        assert_eq!(provider.calls(), vec!["current ETH/USD".to_string()]);

        let rate = resolver.fetch_rate("WETH", "USD", None).await.unwrap();
        assert_eq!(rate.value(), dec!(1900));
        assert_eq!(provider.calls().len(), 1);
    }
}
