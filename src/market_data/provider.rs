// =============================================================================
// Alpaca market-data provider (C3's `DataProvider` implementation)
// =============================================================================
//
// Fetches daily adjusted close bars via Alpaca's market-data API, using the
// same header-key auth and reqwest idiom as the trading client. Paged with
// Alpaca's `next_page_token` cursor; a ticker absent from the response
// simply yields no column in the resulting `BarHistory`, matching the
// contract's "missing tickers are absent columns" rule.
// =============================================================================

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::{BarHistory, DataProvider};

const PAGE_TICKER_BATCH: usize = 200;

pub struct AlpacaDataProvider {
    base_url: String,
    client: reqwest::Client,
}

impl AlpacaDataProvider {
    pub fn new(base_url: impl Into<String>, api_key: &str, api_secret: &str) -> Self {
        let mut default_headers = HeaderMap::new();
        if let Ok(val) = HeaderValue::from_str(api_key) {
            default_headers.insert("APCA-API-KEY-ID", val);
        }
        if let Ok(val) = HeaderValue::from_str(api_secret) {
            default_headers.insert("APCA-API-SECRET-KEY", val);
        }

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

impl std::fmt::Debug for AlpacaDataProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlpacaDataProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Deserialize)]
struct BarsResponse {
    bars: HashMap<String, Vec<Bar>>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct Bar {
    t: String, // RFC-3339 timestamp
    c: f64,    // adjusted close
}

#[async_trait]
impl DataProvider for AlpacaDataProvider {
    #[instrument(skip(self, tickers), name = "alpaca_data::download", fields(count = tickers.len()))]
    async fn download(&self, tickers: &[String], period_days: u32) -> Result<BarHistory> {
        let mut history = BarHistory::new();
        let start = (Utc::now() - Duration::days(period_days as i64))
            .date_naive()
            .format("%Y-%m-%d")
            .to_string();

        for batch in tickers.chunks(PAGE_TICKER_BATCH) {
            let symbols = batch.join(",");
            let mut page_token: Option<String> = None;

            loop {
                let url = format!("{}/v2/stocks/bars", self.base_url);
                let mut request = self
                    .client
                    .get(&url)
                    .query(&[("symbols", symbols.as_str()), ("timeframe", "1Day"), ("start", start.as_str()), ("adjustment", "all")]);
                if let Some(token) = &page_token {
                    request = request.query(&[("page_token", token.as_str())]);
                }

                let response = request.send().await.context("alpaca bars request failed")?;
                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    warn!(status = %status, body, "alpaca bars request returned non-success, skipping batch");
                    break;
                }

                let parsed: BarsResponse = response.json().await.context("failed to parse alpaca bars response")?;
                for (ticker, bars) in parsed.bars {
                    for bar in bars {
                        match NaiveDate::parse_from_str(&bar.t[..10], "%Y-%m-%d") {
                            Ok(date) => history.insert_close(&ticker, date, bar.c),
                            Err(e) => warn!(ticker, raw = %bar.t, error = %e, "unparsable bar timestamp, skipping"),
                        }
                    }
                }

                match parsed.next_page_token {
                    Some(token) if !token.is_empty() => page_token = Some(token),
                    _ => break,
                }
            }
        }

        Ok(history)
    }
}
