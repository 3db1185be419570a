// =============================================================================
// Alpaca REST API Client — header API-key auth
// =============================================================================
//
// SECURITY: the secret key is never logged or serialized. Authentication is
// via the `APCA-API-KEY-ID` / `APCA-API-SECRET-KEY` headers (no request
// signing, unlike the exchange this client replaces).
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{
    Account, Asset, BrokerClient, BrokerPosition, MarketClock, OrderAmount, OrderFill, OrderSide,
    SubmittedOrder,
};
use crate::retry::retry;

/// Transient Alpaca request failures (5xx, timeouts, connection resets) get a
/// handful of retries with a short fixed delay before giving up. Refusal-type
/// responses (4xx) fail the same way on every attempt, so the retry just
/// costs a couple of wasted round trips — cheaper than a full step failure.
const TRANSIENT_RETRY_ATTEMPTS: u32 = 3;
const TRANSIENT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Alpaca trading REST client. One instance per brokerage sub-account.
#[derive(Clone)]
pub struct AlpacaClient {
    base_url: String,
    client: reqwest::Client,
}

impl AlpacaClient {
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
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build reqwest client");

        let base_url = base_url.into();
        debug!(base_url = %base_url, "AlpacaClient initialised");

        Self { base_url, client }
    }
}

impl std::fmt::Debug for AlpacaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlpacaClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct ClockResponse {
    is_open: bool,
}

#[derive(Deserialize)]
struct AccountResponse {
    cash: String,
    equity: String,
    portfolio_value: String,
}

#[derive(Deserialize)]
struct PositionResponse {
    symbol: String,
    qty: String,
    market_value: String,
    unrealized_pl: String,
}

#[derive(Deserialize)]
struct AssetResponse {
    status: String,
    tradable: bool,
    fractionable: bool,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    #[serde(default)]
    filled_avg_price: Option<String>,
    #[serde(default)]
    filled_qty: Option<String>,
}

fn parse_f64(s: &str, field: &str) -> Result<f64> {
    s.parse::<f64>()
        .with_context(|| format!("failed to parse '{field}' value '{s}' as f64"))
}

#[async_trait]
impl BrokerClient for AlpacaClient {
    #[instrument(skip(self), name = "alpaca::get_clock")]
    async fn get_clock(&self) -> Result<MarketClock> {
        retry(TRANSIENT_RETRY_ATTEMPTS, TRANSIENT_RETRY_DELAY, || async {
            let url = format!("{}/v2/clock", self.base_url);
            let resp = self
                .client
                .get(&url)
                .send()
                .await
                .context("GET /v2/clock request failed")?;

            let status = resp.status();
            if !status.is_success() {
                anyhow::bail!("Alpaca GET /v2/clock returned {}", status);
            }

            let body: ClockResponse =
                resp.json().await.context("failed to parse clock response")?;
            Ok(MarketClock {
                is_open: body.is_open,
            })
        })
        .await
    }

    #[instrument(skip(self), name = "alpaca::get_account")]
    async fn get_account(&self) -> Result<Account> {
        let url = format!("{}/v2/account", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /v2/account request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Alpaca GET /v2/account returned {}", status);
        }

        let body: AccountResponse = resp
            .json()
            .await
            .context("failed to parse account response")?;

        Ok(Account {
            cash: parse_f64(&body.cash, "cash")?,
            equity: parse_f64(&body.equity, "equity")?,
            portfolio_value: parse_f64(&body.portfolio_value, "portfolio_value")?,
        })
    }

    #[instrument(skip(self), name = "alpaca::get_all_positions")]
    async fn get_all_positions(&self) -> Result<Vec<BrokerPosition>> {
        let url = format!("{}/v2/positions", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /v2/positions request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Alpaca GET /v2/positions returned {}", status);
        }

        let body: Vec<PositionResponse> = resp
            .json()
            .await
            .context("failed to parse positions response")?;

        body.into_iter()
            .map(|p| {
                Ok(BrokerPosition {
                    symbol: p.symbol,
                    qty: parse_f64(&p.qty, "qty")?,
                    market_value: parse_f64(&p.market_value, "market_value")?,
                    unrealized_pl: parse_f64(&p.unrealized_pl, "unrealized_pl")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), name = "alpaca::get_asset")]
    async fn get_asset(&self, symbol: &str) -> Result<Asset> {
        let url = format!("{}/v2/assets/{}", self.base_url, symbol);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /v2/assets/{symbol} request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Alpaca GET /v2/assets/{} returned {}", symbol, status);
        }

        let body: AssetResponse = resp.json().await.context("failed to parse asset response")?;
        Ok(Asset {
            tradable: body.tradable,
            fractionable: body.fractionable,
            active: body.status == "active",
        })
    }

    #[instrument(skip(self), name = "alpaca::submit_order")]
    async fn submit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: OrderAmount,
    ) -> Result<SubmittedOrder> {
        let side_str = match side {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        };

        let mut payload = serde_json::json!({
            "symbol": symbol,
            "side": side_str,
            "type": "market",
            "time_in_force": "day",
        });

        match amount {
            OrderAmount::Qty(q) => {
                payload["qty"] = serde_json::json!(q);
            }
            OrderAmount::Notional(n) => {
                payload["notional"] = serde_json::json!(n);
            }
        }

        let url = format!("{}/v2/orders", self.base_url);
        let order: OrderResponse = retry(TRANSIENT_RETRY_ATTEMPTS, TRANSIENT_RETRY_DELAY, || async {
            let resp = self
                .client
                .post(&url)
                .json(&payload)
                .send()
                .await
                .context("POST /v2/orders request failed")?;

            let status = resp.status();
            let body: serde_json::Value = resp
                .json()
                .await
                .context("failed to parse order response")?;

            if !status.is_success() {
                anyhow::bail!("Alpaca POST /v2/orders returned {}: {}", status, body);
            }

            serde_json::from_value(body).context("order response missing expected fields")
        })
        .await?;

        debug!(symbol, side = side_str, "order submitted");
        Ok(SubmittedOrder { id: order.id })
    }

    #[instrument(skip(self), name = "alpaca::get_order_by_id")]
    async fn get_order_by_id(&self, id: &str) -> Result<OrderFill> {
        let url = format!("{}/v2/orders/{}", self.base_url, id);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /v2/orders/{id} request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Alpaca GET /v2/orders/{} returned {}", id, status);
        }

        let body: OrderResponse = resp.json().await.context("failed to parse order response")?;

        let filled_avg_price = body
            .filled_avg_price
            .as_deref()
            .and_then(|s| s.parse::<f64>().ok());
        let filled_qty = body
            .filled_qty
            .as_deref()
            .and_then(|s| s.parse::<f64>().ok());

        Ok(OrderFill {
            filled_avg_price,
            filled_qty,
        })
    }

    #[instrument(skip(self), name = "alpaca::close_position")]
    async fn close_position(&self, symbol: &str) -> Result<()> {
        let url = format!("{}/v2/positions/{}", self.base_url, symbol);
        let resp = self
            .client
            .delete(&url)
            .send()
            .await
            .context("DELETE /v2/positions/{symbol} request failed")?;

        let status = resp.status();
        if !status.is_success() {
            warn!(symbol, %status, "Alpaca close_position returned non-success status");
            anyhow::bail!("Alpaca DELETE /v2/positions/{} returned {}", symbol, status);
        }

        Ok(())
    }
}
