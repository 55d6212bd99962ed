use std::sync::Arc;

use fundinfo_market_data::{
    AlphaVantageProvider, CryptoCompareProvider, RateClient, RateProvider, RateResolver,
    RetryPolicy, SymbolTable,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, RateSource};

pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Build the process-wide resolver: the configured point-rate provider
/// (CryptoCompare unless overridden) and Alpha Vantage for daily series.
pub fn build_resolver(config: &Config) -> Arc<RateResolver> {
    if config.cryptocompare_api_key.is_empty() {
        tracing::warn!("FUNDINFO_CRYPTOCOMPARE_API_KEY is not set");
    }
    if config.alphavantage_api_key.is_empty() {
        tracing::warn!("FUNDINFO_ALPHAVANTAGE_API_KEY is not set");
    }

    let policy = RetryPolicy {
        retry_count: config.retry_count,
        rate_limit_delay: config.rate_limit_delay,
    };
    let cryptocompare = match &config.cryptocompare_base_url {
        Some(url) => {
            tracing::info!("Using CryptoCompare mirror at {}", url);
            CryptoCompareProvider::with_base_url(config.cryptocompare_api_key.clone(), url.clone())
        }
        None => CryptoCompareProvider::new(config.cryptocompare_api_key.clone()),
    };
    let alpha_vantage = Arc::new(AlphaVantageProvider::new(config.alphavantage_api_key.clone()));

    let rate_source = config.rate_provider.parse::<RateSource>().unwrap_or_else(|e| {
        tracing::warn!("{}, using CryptoCompare", e);
        RateSource::CryptoCompare
    });
    let point_provider: Arc<dyn RateProvider> = match rate_source {
        RateSource::CryptoCompare => Arc::new(cryptocompare),
        RateSource::AlphaVantage => alpha_vantage.clone(),
    };
    let rates = RateClient::with_policy(point_provider, policy.clone());
    let series = RateClient::with_policy(alpha_vantage, policy);
    let symbols =
        SymbolTable::new().with_compounding_token("CUSDC", "USDC", config.compounding_factor);

    tracing::info!(
        "Rates via {}, series via {}, {} attempts, {:?} rate-limit delay",
        rates.provider_id(),
        series.provider_id(),
        config.retry_count,
        config.rate_limit_delay
    );

    Arc::new(RateResolver::new(rates, series, symbols))
}
