//! Canned quote backend.

use tracing::debug;

use crate::error::MarketResult;
use crate::quote::{Quote, QuoteBackend};

/// Backend that answers every symbol with a copy of `base_quote`.
///
/// Useful for local runs without network access and for tests.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    /// Quote returned for every symbol, with `symbol` replaced.
    pub base_quote: Quote,
}

impl FakeBackend {
    /// Create a fake backend around a base quote.
    pub fn new(base_quote: Quote) -> Self {
        Self { base_quote }
    }
}

#[async_trait::async_trait]
impl QuoteBackend for FakeBackend {
    async fn quote(&self, symbols: &[String]) -> MarketResult<Vec<Quote>> {
        debug!(count = symbols.len(), "Serving fake quotes");

        Ok(symbols
            .iter()
            .map(|symbol| Quote {
                symbol: symbol.clone(),
                ..self.base_quote.clone()
            })
            .collect())
    }
}
