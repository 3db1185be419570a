// =============================================================================
// Order Executor (C6)
// =============================================================================

use std::collections::HashMap;
use std::time::Duration;

use tracing::{info, warn};

use crate::broker::{BrokerClient, OrderAmount, OrderFill, OrderSide};

/// Settlement delay observed between closes and subsequent buys in the same
/// rebalance invocation.
const SETTLEMENT_DELAY: Duration = Duration::from_secs(3);

/// Number of best-effort fill polls for a live-account order.
const FILL_POLL_ATTEMPTS: u32 = 10;
const FILL_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Execution {
    pub qty: f64,
    pub price: f64,
}

/// Liquidate every position in `tickers`. Per-ticker failures are logged and
/// collected rather than short-circuiting the batch. Waits a settlement
/// delay afterward so subsequent buys see updated buying power.
pub async fn close(broker: &dyn BrokerClient, tickers: &[String]) -> Vec<(String, anyhow::Error)> {
    let mut failures = Vec::new();

    for ticker in tickers {
        if let Err(e) = broker.close_position(ticker).await {
            warn!(ticker, error = %e, "failed to close position");
            failures.push((ticker.clone(), e));
        } else {
            info!(ticker, "position closed");
        }
    }

    if !tickers.is_empty() {
        tokio::time::sleep(SETTLEMENT_DELAY).await;
    }

    failures
}

/// Open new positions across `tickers`, sized at `cash_per_position` each.
/// Fractional-share tickers use a notional BUY; whole-share-only tickers use
/// a floored quantity BUY, skipped if the floor rounds to zero.
///
/// `poll_fills` controls whether submitted orders are polled for their fill
/// price/qty (used for live accounts, where downstream ledger attribution
/// needs the actual fill rather than the price hint).
pub async fn open(
    broker: &dyn BrokerClient,
    tickers: &[String],
    cash_per_position: f64,
    price_hint: &HashMap<String, f64>,
    fractionable: &HashMap<String, bool>,
    poll_fills: bool,
) -> Result<Vec<(String, Execution)>, anyhow::Error> {
    if cash_per_position < 1.0 {
        anyhow::bail!(
            "refusing to open positions: cash_per_position {:.2} < 1.00",
            cash_per_position
        );
    }

    let mut executions = Vec::new();

    for ticker in tickers {
        let is_fractionable = fractionable.get(ticker).copied().unwrap_or(false);
        let hint = price_hint.get(ticker).copied();

        let amount = if is_fractionable {
            OrderAmount::Notional((cash_per_position * 100.0).round() / 100.0)
        } else {
            let Some(price) = hint else {
                warn!(ticker, "no price hint for non-fractionable ticker, skipping");
                continue;
            };
            let qty = (cash_per_position / price).floor();
            if qty < 1.0 {
                warn!(ticker, cash_per_position, price, "floored qty < 1, skipping");
                continue;
            }
            OrderAmount::Qty(qty)
        };

        let order = match broker.submit_order(ticker, OrderSide::Buy, amount).await {
            Ok(o) => o,
            Err(e) => {
                warn!(ticker, error = %e, "order submission failed");
                continue;
            }
        };

        let fill = if poll_fills {
            poll_for_fill(broker, &order.id).await
        } else {
            OrderFill::default()
        };

        let execution = match (fill.filled_avg_price, fill.filled_qty) {
            (Some(price), Some(qty)) => Execution { qty, price },
            _ => {
                // Not filled in time (or polling skipped) — fall back to
                // the price hint and the amount we intended to buy.
                let price = hint.unwrap_or(cash_per_position);
                let qty = match amount {
                    OrderAmount::Qty(q) => q,
                    OrderAmount::Notional(n) => {
                        if price > 0.0 {
                            n / price
                        } else {
                            0.0
                        }
                    }
                };
                Execution { qty, price }
            }
        };

        info!(ticker, qty = execution.qty, price = execution.price, "position opened");
        executions.push((ticker.clone(), execution));
    }

    Ok(executions)
}

async fn poll_for_fill(broker: &dyn BrokerClient, order_id: &str) -> OrderFill {
    for _ in 0..FILL_POLL_ATTEMPTS {
        match broker.get_order_by_id(order_id).await {
            Ok(fill) if fill.filled_avg_price.is_some() && fill.filled_qty.is_some() => {
                return fill;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(order_id, error = %e, "fill poll failed");
            }
        }
        tokio::time::sleep(FILL_POLL_INTERVAL).await;
    }
    OrderFill::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{Account, Asset, BrokerPosition, MarketClock, SubmittedOrder};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StubBroker {
        close_calls: Mutex<Vec<String>>,
        submitted: Mutex<Vec<(String, OrderSide, OrderAmount)>>,
        order_counter: AtomicUsize,
        fail_close: Vec<String>,
    }

    impl StubBroker {
        fn new() -> Self {
            Self {
                close_calls: Mutex::new(Vec::new()),
                submitted: Mutex::new(Vec::new()),
                order_counter: AtomicUsize::new(0),
                fail_close: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl BrokerClient for StubBroker {
        async fn get_clock(&self) -> anyhow::Result<MarketClock> {
            unimplemented!()
        }
        async fn get_account(&self) -> anyhow::Result<Account> {
            unimplemented!()
        }
        async fn get_all_positions(&self) -> anyhow::Result<Vec<BrokerPosition>> {
            unimplemented!()
        }
        async fn get_asset(&self, _symbol: &str) -> anyhow::Result<Asset> {
            unimplemented!()
        }
        async fn submit_order(
            &self,
            symbol: &str,
            side: OrderSide,
            amount: OrderAmount,
        ) -> anyhow::Result<SubmittedOrder> {
            self.submitted
                .lock()
                .unwrap()
                .push((symbol.to_string(), side, amount));
            let id = self.order_counter.fetch_add(1, Ordering::SeqCst);
            Ok(SubmittedOrder { id: id.to_string() })
        }
        async fn get_order_by_id(&self, _id: &str) -> anyhow::Result<OrderFill> {
            Ok(OrderFill::default())
        }
        async fn close_position(&self, symbol: &str) -> anyhow::Result<()> {
            if self.fail_close.contains(&symbol.to_string()) {
                anyhow::bail!("close failed for {symbol}");
            }
            self.close_calls.lock().unwrap().push(symbol.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn close_collects_per_ticker_failures_without_short_circuiting() {
        let mut broker = StubBroker::new();
        broker.fail_close = vec!["BAD".to_string()];
        let tickers = vec!["GOOD".to_string(), "BAD".to_string(), "ALSO_GOOD".to_string()];

        let failures = close(&broker, &tickers).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "BAD");
        assert_eq!(
            *broker.close_calls.lock().unwrap(),
            vec!["GOOD".to_string(), "ALSO_GOOD".to_string()]
        );
    }

    #[tokio::test]
    async fn open_refuses_when_cash_per_position_below_one_dollar() {
        let broker = StubBroker::new();
        let result = open(
            &broker,
            &["AAPL".to_string()],
            0.50,
            &HashMap::new(),
            &HashMap::new(),
            false,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn open_uses_notional_for_fractionable_tickers() {
        let broker = StubBroker::new();
        let mut fractionable = HashMap::new();
        fractionable.insert("AAPL".to_string(), true);

        let result = open(
            &broker,
            &["AAPL".to_string()],
            250.0,
            &HashMap::new(),
            &fractionable,
            false,
        )
        .await
        .unwrap();

        assert_eq!(result.len(), 1);
        let submitted = broker.submitted.lock().unwrap();
        assert!(matches!(submitted[0].2, OrderAmount::Notional(n) if (n - 250.0).abs() < 1e-9));
    }

    #[tokio::test]
    async fn open_floors_qty_for_non_fractionable_and_skips_if_zero() {
        let broker = StubBroker::new();
        let mut fractionable = HashMap::new();
        fractionable.insert("XYZ".to_string(), false);
        let mut hints = HashMap::new();
        hints.insert("XYZ".to_string(), 100.0);

        // cash_per_position=250, price=100 => floor(2.5) = 2 shares.
        let result = open(&broker, &["XYZ".to_string()], 250.0, &hints, &fractionable, false)
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].1.qty, 2.0);

        // cash_per_position=50, price=100 => floor(0.5) = 0, skipped.
        let broker2 = StubBroker::new();
        let result2 = open(&broker2, &["XYZ".to_string()], 50.0, &hints, &fractionable, false)
            .await
            .unwrap();
        assert!(result2.is_empty());
    }
}
