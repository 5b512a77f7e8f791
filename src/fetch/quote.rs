//! Market quote fetcher (Yahoo Finance v7 `quote` API shape)

use async_trait::async_trait;
use serde::Deserialize;

use super::{FetchError, Fetcher};
use crate::data::{Reading, SOURCE_FINANCE};

/// Default quote endpoint
pub const DEFAULT_QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

/// Tickers polled on every tick, in one batched request
pub const QUOTE_SYMBOLS: [&str; 5] = ["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Quote {
    symbol: String,
    regular_market_price: Option<f64>,
    post_market_price: Option<f64>,
    pre_market_price: Option<f64>,
}

impl Quote {
    /// Real-time price, then post-market, then pre-market
    fn price(&self) -> Option<f64> {
        [
            self.regular_market_price,
            self.post_market_price,
            self.pre_market_price,
        ]
        .into_iter()
        .flatten()
        .find(|p| p.is_finite())
    }
}

/// Turn a quote API body into readings.
///
/// Symbols without a resolvable price are left out rather than reported
/// as zero.
pub fn readings_from_quotes(body: &[u8]) -> Result<Vec<Reading>, FetchError> {
    let envelope: QuoteEnvelope =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let readings = envelope
        .quote_response
        .result
        .into_iter()
        .filter_map(|quote| match quote.price() {
            Some(price) => Reading::new(SOURCE_FINANCE, quote.symbol, price).ok(),
            None => {
                tracing::debug!(symbol = %quote.symbol, "Quote has no resolvable price");
                None
            }
        })
        .collect();

    Ok(readings)
}

/// Fetches the fixed ticker list in one request per tick
pub struct QuoteFetcher {
    client: reqwest::Client,
    url: String,
    symbols: Vec<String>,
}

impl QuoteFetcher {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            symbols: QUOTE_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Override the polled tickers
    pub fn with_symbols(mut self, symbols: Vec<String>) -> Self {
        self.symbols = symbols;
        self
    }

    async fn fetch_batch(&self) -> Result<Vec<Reading>, FetchError> {
        let body = self
            .client
            .get(&self.url)
            .query(&[("symbols", self.symbols.join(","))])
            .header(
                reqwest::header::USER_AGENT,
                concat!("pulseboard/", env!("CARGO_PKG_VERSION")),
            )
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        readings_from_quotes(&body)
    }
}

#[async_trait]
impl Fetcher for QuoteFetcher {
    fn source(&self) -> &str {
        SOURCE_FINANCE
    }

    async fn fetch(&self) -> Vec<Result<Reading, FetchError>> {
        match self.fetch_batch().await {
            Ok(readings) => readings.into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        }
    }
}
