//! Quote model and the backend contract.

use serde::{Deserialize, Serialize};

use crate::error::MarketResult;

/// Point-in-time market data for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Ticker symbol (e.g. `AAPL`).
    pub symbol: String,
    /// Short display name (e.g. `Apple Inc.`).
    #[serde(default)]
    pub short_name: String,
    /// Long display name, if the provider has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    /// Regular market price.
    pub price: f64,
    /// Absolute change since the previous close.
    pub change: f64,
    /// Percent change since the previous close.
    pub change_percent: f64,
}

impl Quote {
    /// Name to show next to the symbol.
    ///
    /// Falls back to the long name, then the symbol itself.
    pub fn display_name(&self) -> &str {
        if !self.short_name.is_empty() {
            &self.short_name
        } else if let Some(long_name) = self.long_name.as_deref().filter(|n| !n.is_empty()) {
            long_name
        } else {
            &self.symbol
        }
    }
}

/// A source of market quotes.
///
/// Implementations make at most one upstream lookup per call. Callers must
/// not rely on the returned quotes lining up index-for-index with `symbols`:
/// unknown symbols may be dropped.
#[async_trait::async_trait]
pub trait QuoteBackend: Send + Sync {
    /// Look up quotes for the given symbols.
    async fn quote(&self, symbols: &[String]) -> MarketResult<Vec<Quote>>;
}
