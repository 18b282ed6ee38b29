//! Yahoo Finance quote backend.
//!
//! Looks quotes up with a single call to the `v7/finance/quote` endpoint,
//! passing every requested symbol at once.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{MarketError, MarketResult};
use crate::quote::{Quote, QuoteBackend};

/// Default Yahoo Finance API host.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

const QUOTE_PATH: &str = "/v7/finance/quote";

/// Quote backend backed by Yahoo Finance.
#[derive(Debug, Clone)]
pub struct YahooBackend {
    client: reqwest::Client,
    base_url: String,
}

impl YahooBackend {
    /// Create a backend talking to the public Yahoo Finance API.
    pub fn new() -> MarketResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a backend against a different API host.
    pub fn with_base_url(base_url: impl Into<String>) -> MarketResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("stonks/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MarketError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl QuoteBackend for YahooBackend {
    async fn quote(&self, symbols: &[String]) -> MarketResult<Vec<Quote>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}{}", self.base_url, QUOTE_PATH);
        debug!(symbols = %symbols.join(","), "Requesting Yahoo Finance quotes");

        let response = self
            .client
            .get(&url)
            .query(&[("symbols", symbols.join(","))])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::Status { status, body });
        }

        let body: QuoteResponseBody = response.json().await?;
        body.into_quotes()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponseBody {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Option<Vec<YahooQuote>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    symbol: String,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    regular_market_change: Option<f64>,
    #[serde(default)]
    regular_market_change_percent: Option<f64>,
}

impl QuoteResponseBody {
    fn into_quotes(self) -> MarketResult<Vec<Quote>> {
        if let Some(error) = self.quote_response.error.filter(|e| !e.is_null()) {
            let description = error
                .get("description")
                .and_then(|d| d.as_str())
                .map(|d| d.to_string())
                .unwrap_or_else(|| error.to_string());
            return Err(MarketError::Provider(description));
        }

        Ok(self
            .quote_response
            .result
            .unwrap_or_default()
            .into_iter()
            .filter_map(|q| {
                let Some(price) = q.regular_market_price else {
                    warn!(symbol = %q.symbol, "Skipping quote without a market price");
                    return None;
                };
                Some(Quote {
                    symbol: q.symbol,
                    short_name: q.short_name.unwrap_or_default(),
                    long_name: q.long_name,
                    price,
                    change: q.regular_market_change.unwrap_or_default(),
                    change_percent: q.regular_market_change_percent.unwrap_or_default(),
                })
            })
            .collect())
    }
}
