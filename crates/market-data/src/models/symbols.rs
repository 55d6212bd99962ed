//! Symbol normalization tables.
//!
//! Wrapped and bridged tokens are priced through their canonical asset, and
//! USD-pegged stablecoins collapse onto `USD`. Interest-bearing wrappers
//! (compound tokens) are priced through their underlying asset scaled by a
//! fixed exchange factor.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::Symbol;

/// The pivot currency for proxy triangulation.
pub const USD: &str = "USD";

/// Approximate cUSDC -> USDC exchange factor. Compound tokens accrue
/// interest, so this drifts over time; override it through configuration.
pub const DEFAULT_COMPOUNDING_FACTOR: Decimal = dec!(0.021);

/// An interest-bearing wrapper priced through its underlying asset.
#[derive(Clone, Debug)]
pub struct CompoundingToken {
    /// Symbol the provider actually prices.
    pub underlying: Symbol,
    /// Units of underlying per unit of the wrapper.
    pub factor: Decimal,
}

/// Result of normalizing a single symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedSymbol {
    /// Canonical symbol used for cache keys and provider calls.
    pub symbol: Symbol,
    /// Units of `symbol` per unit of the requested symbol.
    pub factor: Decimal,
}

/// Immutable alias, stablecoin and compounding-token tables.
///
/// Built once at start-up and shared by the resolver; never mutated afterwards.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    /// Synonym -> canonical symbol.
    aliases: HashMap<Symbol, Symbol>,
    /// USD-pegged stablecoins in proxy preference order.
    usd_proxies: Vec<Symbol>,
    /// Wrapper symbol -> underlying asset and factor.
    compounding: HashMap<Symbol, CompoundingToken>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table with the default mappings.
    pub fn new() -> Self {
        let mut table = Self {
            aliases: HashMap::new(),
            usd_proxies: Vec::new(),
            compounding: HashMap::new(),
        };
        table.load_defaults();
        table
    }

    fn load_defaults(&mut self) {
        self.add_aliases("BTC", &["WBTC", "TBTC", "IMBTC"]);
        self.add_aliases("ETH", &["WETH"]);
        for stablecoin in ["DAI", "USDC", "USDT", "GUSD", "PAX"] {
            self.aliases.insert(stablecoin.to_string(), USD.to_string());
            self.usd_proxies.push(stablecoin.to_string());
        }
        self.compounding.insert(
            "CUSDC".to_string(),
            CompoundingToken {
                underlying: "USDC".to_string(),
                factor: DEFAULT_COMPOUNDING_FACTOR,
            },
        );
    }

    fn add_aliases(&mut self, canonical: &str, synonyms: &[&str]) {
        for synonym in synonyms {
            self.aliases
                .insert(synonym.to_uppercase(), canonical.to_uppercase());
        }
    }

    /// Replace the exchange factor of a compounding token, or register a new one.
    pub fn with_compounding_token(mut self, symbol: &str, underlying: &str, factor: Decimal) -> Self {
        self.compounding.insert(
            symbol.to_uppercase(),
            CompoundingToken {
                underlying: underlying.to_uppercase(),
                factor,
            },
        );
        self
    }

    /// Upper-cases `symbol` and maps synonyms onto their canonical symbol.
    pub fn canonicalize(&self, symbol: &str) -> Symbol {
        let upper = symbol.trim().to_uppercase();
        match self.aliases.get(&upper) {
            Some(canonical) => canonical.clone(),
            None => upper,
        }
    }

    /// Canonicalizes `symbol`, unwrapping compounding tokens first.
    pub fn normalize(&self, symbol: &str) -> NormalizedSymbol {
        let upper = symbol.trim().to_uppercase();
        match self.compounding.get(&upper) {
            Some(token) => NormalizedSymbol {
                symbol: self.canonicalize(&token.underlying),
                factor: token.factor,
            },
            None => NormalizedSymbol {
                symbol: self.canonicalize(&upper),
                factor: Decimal::ONE,
            },
        }
    }

    /// True for `USD` itself and every pegged stablecoin.
    pub fn is_usd_like(&self, symbol: &str) -> bool {
        let upper = symbol.trim().to_uppercase();
        upper == USD || self.usd_proxies.iter().any(|s| *s == upper)
    }

    /// Stablecoins tried, in order, when a direct USD rate is unavailable.
    pub fn usd_proxies(&self) -> &[Symbol] {
        &self.usd_proxies
    }
}
