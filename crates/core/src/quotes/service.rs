use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::{join, join_all};
use fundinfo_market_data::{Rate, RateResolver};
use log::{debug, warn};

use super::converter::{convert_amount, convert_return};
use super::model::QuotedFund;
use crate::errors::{Error, Result};
use crate::funds::Fund;

/// Prices funds in a quote symbol through a shared rate resolver.
pub struct FundQuoteService {
    resolver: Arc<RateResolver>,
}

impl FundQuoteService {
    pub fn new(resolver: Arc<RateResolver>) -> Self {
        Self { resolver }
    }

    /// Quote a single fund. Fails only when the current rate is unavailable;
    /// a missing historical rate just leaves that window's return out.
    pub async fn quote_fund(&self, fund: &Fund, quote: &str) -> Result<QuotedFund> {
        let denom = fund.denom_symbol.as_str();

        let current = self.resolver.fetch_rate(denom, quote, None);
        let past = join_all(fund.window_starts.iter().map(|(window, start)| async move {
            (*window, self.resolver.fetch_rate(denom, quote, Some(*start)).await)
        }));
        let (current, past) = join(current, past).await;
        let current = current?;

        let mut returns = BTreeMap::new();
        for (window, past_rate) in past {
            let past_rate: Option<Rate> = match past_rate {
                Ok(rate) => Some(rate),
                Err(e) => {
                    warn!(
                        "No {} {}/{} rate for {}: {}",
                        window, denom, quote, fund.name, e
                    );
                    None
                }
            };
            let native = fund.returns.get(&window).copied();
            match convert_return(native, Some(current), past_rate) {
                Some(converted) => {
                    returns.insert(window, converted);
                }
                None if native.is_some() && past_rate.is_some() => {
                    warn!(
                        "Ignoring implausible {} return {:?} for {}",
                        window, native, fund.name
                    );
                }
                None => {}
            }
        }

        Ok(QuotedFund {
            name: fund.name.clone(),
            address: fund.address.clone(),
            denom_symbol: fund.denom_symbol.clone(),
            quote_symbol: quote.to_string(),
            inception_timestamp: fund.inception_timestamp,
            aum: convert_amount(fund.aum, Some(current)),
            share_price: convert_amount(fund.share_price, Some(current)),
            returns,
            platform_name: fund.platform_name.clone(),
            platform_url: fund.platform_url.clone(),
        })
    }

    /// Quote every fund concurrently. Funds whose current rate cannot be
    /// resolved are left out; the batch fails only if none could be priced.
    pub async fn quote_funds(&self, funds: &[Fund], quote: &str) -> Result<Vec<QuotedFund>> {
        if funds.is_empty() {
            return Ok(Vec::new());
        }

        let results = join_all(funds.iter().map(|fund| self.quote_fund(fund, quote))).await;

        let mut quoted = Vec::with_capacity(funds.len());
        for (fund, result) in funds.iter().zip(results) {
            match result {
                Ok(q) => quoted.push(q),
                Err(e) => warn!("Error quoting fund {} ({}): {}", fund.name, fund.address, e),
            }
        }

        debug!("Quoted {}/{} funds in {}", quoted.len(), funds.len(), quote);

        if quoted.is_empty() {
            return Err(Error::NoPricesFound {
                quote: quote.to_string(),
            });
        }
        Ok(quoted)
    }
}
