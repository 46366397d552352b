//! Yahoo Finance chart client for the Bovespa index (^BVSP).

use thiserror::Error;
use tracing::info;


const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const BVSP_CHART_PATH: &str = "/v8/finance/chart/%5EBVSP";

// Yahoo rejects requests without a browser-like user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64)";

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("quote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("regularMarketPrice missing from chart response")]
    MissingPrice,
}

/// Client for fetching the current Bovespa index value.
#[derive(Debug, Clone)]
pub struct QuoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl QuoteClient {
    pub fn new() -> Result<Self, MarketError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at a different host, used by tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, MarketError> {
        let http = reqwest::ClientBuilder::new()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetch the current ^BVSP value from the chart endpoint.
    pub async fn fetch_index(&self) -> Result<f64, MarketError> {
        let url = format!("{}{}", self.base_url, BVSP_CHART_PATH);
        info!("Fetching Bovespa value from {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("interval", "1m"),
                ("includePrePost", "true"),
                ("events", "div|split|earn"),
                ("lang", "en-US"),
                ("region", "US"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        response["chart"]["result"][0]["meta"]["regularMarketPrice"]
            .as_f64()
            .ok_or(MarketError::MissingPrice)
    }
}
