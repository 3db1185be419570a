pub mod alpaca;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use alpaca::AlpacaClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketClock {
    pub is_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Account {
    pub cash: f64,
    pub equity: f64,
    pub portfolio_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrokerPosition {
    pub symbol: String,
    pub qty: f64,
    pub market_value: f64,
    pub unrealized_pl: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub tradable: bool,
    pub fractionable: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Either a share quantity or a dollar notional — exactly one is set,
/// matching the brokerage API's mutually exclusive `qty` / `notional`
/// order fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderAmount {
    Qty(f64),
    Notional(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedOrder {
    pub id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrderFill {
    pub filled_avg_price: Option<f64>,
    pub filled_qty: Option<f64>,
}

/// Brokerage API contract consumed by C6/C7/C9: market clock, account
/// equity, current positions, asset tradability, and market order
/// submission/polling/liquidation. Two credential sets per strategy select
/// distinct sub-accounts; paper vs. live is a base-URL choice, not a
/// separate trait implementation.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    async fn get_clock(&self) -> anyhow::Result<MarketClock>;
    async fn get_account(&self) -> anyhow::Result<Account>;
    async fn get_all_positions(&self) -> anyhow::Result<Vec<BrokerPosition>>;
    async fn get_asset(&self, symbol: &str) -> anyhow::Result<Asset>;
    async fn submit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: OrderAmount,
    ) -> anyhow::Result<SubmittedOrder>;
    async fn get_order_by_id(&self, id: &str) -> anyhow::Result<OrderFill>;
    async fn close_position(&self, symbol: &str) -> anyhow::Result<()>;
}
