//! Integration tests for batch fund quoting against an in-memory provider.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use fundinfo_core::funds::{sort_quoted_funds, Fund, NewFund, ReturnWindow, SharePrices, SortKey};
use fundinfo_core::quotes::FundQuoteService;
use fundinfo_core::Error;
use fundinfo_market_data::{
    MarketDataError, ProviderCapabilities, Rate, RateClient, RateLimit, RateProvider, RateResolver,
    RetryPolicy, SymbolTable,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// =============================================================================
// Mock provider
// =============================================================================

/// Serves one table for current rates and another for every past instant.
#[derive(Default)]
struct TwoPointProvider {
    current: HashMap<(String, String), Decimal>,
    historical: HashMap<(String, String), Decimal>,
    calls: AtomicUsize,
}

impl TwoPointProvider {
    fn with_pair(mut self, denom: &str, quote: &str, past: Decimal, now: Decimal) -> Self {
        let key = (denom.to_string(), quote.to_string());
        self.historical.insert(key.clone(), past);
        self.current.insert(key, now);
        self
    }

    fn lookup(
        &self,
        table: &HashMap<(String, String), Decimal>,
        denom: &str,
        quote: &str,
    ) -> Result<Rate, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        table
            .get(&(denom.to_string(), quote.to_string()))
            .map(|v| Rate::new(*v).unwrap())
            .ok_or_else(|| MarketDataError::RateNotFound(format!("{}/{}", denom, quote)))
    }
}

#[async_trait]
impl RateProvider for TwoPointProvider {
    fn id(&self) -> &'static str {
        "TWO_POINT"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_current: true,
            supports_historical: true,
            supports_time_series: false,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 60_000,
            burst: 1_000,
        }
    }

    async fn fetch_current_rate(&self, denom: &str, quote: &str) -> Result<Rate, MarketDataError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.lookup(&self.current, denom, quote)
    }

    async fn fetch_historical_rate(
        &self,
        denom: &str,
        quote: &str,
        _timestamp: DateTime<Utc>,
    ) -> Result<Rate, MarketDataError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.lookup(&self.historical, denom, quote)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn service_with(provider: Arc<TwoPointProvider>) -> FundQuoteService {
    let policy = RetryPolicy {
        retry_count: 2,
        rate_limit_delay: Duration::from_millis(1),
    };
    let resolver = RateResolver::new(
        RateClient::with_policy(provider.clone(), policy.clone()),
        RateClient::with_policy(provider, policy),
        SymbolTable::new(),
    );
    FundQuoteService::new(Arc::new(resolver))
}

fn fund(name: &str, denom: &str, aum: Decimal, current: Decimal, past: Decimal) -> Fund {
    let mut past_prices = BTreeMap::new();
    past_prices.insert(ReturnWindow::LastMonth, past);
    past_prices.insert(ReturnWindow::Inception, past);

    let now = Utc::now();
    Fund::new(
        NewFund {
            name: name.to_string(),
            address: format!("0x{}", name.to_lowercase()),
            denom_symbol: denom.to_string(),
            inception_timestamp: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
            aum: Some(aum),
            share_prices: SharePrices {
                current: Some(current),
                past: past_prices,
            },
            platform_name: "Melon".to_string(),
            platform_url: "https://melon.fund".to_string(),
        },
        now,
    )
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_quotes_returns_and_amounts_in_quote_currency() {
    let provider = Arc::new(TwoPointProvider::default().with_pair("ETH", "USD", dec!(1000), dec!(2000)));
    let service = service_with(provider);

    // 10% in ETH while ETH doubled against USD
    let funds = vec![fund("Alpha", "WETH", dec!(5), dec!(1.1), dec!(1.0))];
    let quoted = service.quote_funds(&funds, "USD").await.unwrap();

    assert_eq!(quoted.len(), 1);
    let alpha = &quoted[0];
    assert_eq!(alpha.quote_symbol, "USD");
    assert_eq!(alpha.aum, Some(dec!(10000)));
    assert_eq!(alpha.share_price, Some(dec!(2200.0)));
    assert_eq!(alpha.returns[&ReturnWindow::LastMonth], dec!(1.2));
    assert_eq!(alpha.returns[&ReturnWindow::Inception], dec!(1.2));
    // no native share price for these windows
    assert!(!alpha.returns.contains_key(&ReturnWindow::LastDay));
    assert!(!alpha.returns.contains_key(&ReturnWindow::YearStart));
}

#[tokio::test]
async fn test_same_currency_needs_no_rates() {
    let provider = Arc::new(TwoPointProvider::default());
    let service = service_with(provider.clone());

    let funds = vec![fund("Stable", "DAI", dec!(100), dec!(1.05), dec!(1.0))];
    let quoted = service.quote_funds(&funds, "USDC").await.unwrap();

    assert_eq!(quoted[0].aum, Some(dec!(100)));
    assert_eq!(quoted[0].returns[&ReturnWindow::LastMonth], dec!(0.05));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unpriceable_fund_is_isolated() {
    let provider = Arc::new(TwoPointProvider::default().with_pair("ETH", "USD", dec!(1000), dec!(1000)));
    let service = service_with(provider);

    let funds = vec![
        fund("Priced", "ETH", dec!(1), dec!(2), dec!(1)),
        fund("Orphan", "XYZ", dec!(1), dec!(2), dec!(1)),
    ];
    let quoted = service.quote_funds(&funds, "USD").await.unwrap();

    assert_eq!(quoted.len(), 1);
    assert_eq!(quoted[0].name, "Priced");
    assert_eq!(quoted[0].returns[&ReturnWindow::LastMonth], dec!(1));
}

#[tokio::test]
async fn test_no_prices_found_when_nothing_priced() {
    let provider = Arc::new(TwoPointProvider::default());
    let service = service_with(provider);

    let funds = vec![fund("Orphan", "XYZ", dec!(1), dec!(2), dec!(1))];
    let err = service.quote_funds(&funds, "USD").await.unwrap_err();

    assert!(matches!(err, Error::NoPricesFound { ref quote } if quote == "USD"));
    assert!(service.quote_funds(&[], "USD").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_implausible_native_return_is_dropped() {
    let provider = Arc::new(TwoPointProvider::default().with_pair("ETH", "USD", dec!(1000), dec!(1000)));
    let service = service_with(provider);

    // share price went from 1 to 20: +1900%
    let funds = vec![fund("Spike", "ETH", dec!(1), dec!(20), dec!(1))];
    let quoted = service.quote_funds(&funds, "USD").await.unwrap();

    assert!(quoted[0].returns.is_empty());
    assert_eq!(quoted[0].share_price, Some(dec!(20000)));
}

#[tokio::test]
async fn test_sorting_quoted_funds_by_aum() {
    let provider = Arc::new(
        TwoPointProvider::default()
            .with_pair("ETH", "USD", dec!(1000), dec!(1000))
            .with_pair("BTC", "USD", dec!(10000), dec!(10000)),
    );
    let service = service_with(provider);

    let funds = vec![
        fund("Small", "ETH", dec!(1), dec!(1), dec!(1)),
        fund("Large", "WBTC", dec!(1), dec!(1), dec!(1)),
    ];
    let mut quoted = service.quote_funds(&funds, "USD").await.unwrap();
    sort_quoted_funds(&mut quoted, SortKey::Aum, false);

    assert_eq!(quoted[0].name, "Large");
    assert_eq!(quoted[1].name, "Small");
}
