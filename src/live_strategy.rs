// =============================================================================
// Live Multi-Bucket Strategy (C9)
// =============================================================================
//
// Drives one brokerage account as three virtual sub-accounts (low, medium,
// high) via the ledger's allocation math. Execution decisions are driven by
// broker fact, not ledger fact: the ledger tracks *whose* capital funds a
// position, never *what the broker is actually holding*. Diffing against
// ledger-recorded positions would let ledger drift (a missed distribute, a
// manual broker adjustment) silently desynchronize from what's really in the
// account; broker positions are always the executable truth.
// =============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{info, warn};

use crate::broker::BrokerClient;
use crate::error::CoreError;
use crate::execution;
use crate::ledger::Ledger;
use crate::market_data::{universe, MarketDataLoader};
use crate::selector;
use crate::tradability::filter_tradable;
use crate::types::{Bucket, Side};

pub struct LiveStrategy {
    pub broker: Arc<dyn BrokerClient>,
    pub ledger: Arc<Ledger>,
    pub top_n: usize,
}

impl LiveStrategy {
    pub fn new(broker: Arc<dyn BrokerClient>, ledger: Arc<Ledger>, top_n: usize) -> Self {
        Self { broker, ledger, top_n }
    }

    /// Per-ticker close/open failures and refusal conditions (capital <=
    /// 0, per-position below $1) are logged inside `close_and_distribute`/
    /// `open_and_distribute` and never escalate — only a failure outside
    /// those execution loops (market-data load, `get_all_positions`,
    /// `get_account`) counts toward `failed_steps` below.
    pub async fn rebalance(&self, loader: &MarketDataLoader, now: chrono::NaiveDate) -> Result<(), CoreError> {
        self.ledger
            .process_pending()
            .map_err(|e| reconciliation_failed(format!("process_pending: {e}")))?;

        let current_prices = HashMap::new(); // filled in below, per-bucket, from each bucket's own history load
        let allocations = if self.ledger.has_investors() {
            self.ledger.allocations(&current_prices)
        } else {
            let account = self
                .broker
                .get_account()
                .await
                .map_err(|e| reconciliation_failed(format!("get_account: {e}")))?;
            default_split_allocations(account.equity)
        };

        let broker_positions = self
            .broker
            .get_all_positions()
            .await
            .map_err(|e| reconciliation_failed(format!("get_all_positions: {e}")))?;
        let broker_held: HashMap<String, f64> = broker_positions
            .iter()
            .filter(|p| p.qty > 0.0)
            .map(|p| (p.symbol.clone(), p.qty))
            .collect();

        let mut failed_steps = 0usize;
        let mut total_steps = 0usize;

        for &bucket in &Bucket::ALL {
            let capital = allocations.get(&bucket).map(|a| a.total).unwrap_or(0.0);
            if capital <= 0.0 {
                continue;
            }

            let universe_name = match bucket {
                Bucket::Low => "low-bucket-slice",
                Bucket::Medium => "medium",
                Bucket::High => "high",
            };
            let universe_list = bucket_universe(universe_name);

            let history = match loader.load(&universe_list).await {
                Ok(h) => h,
                Err(e) => {
                    warn!(?bucket, error = %e, "market data load failed for bucket");
                    failed_steps += 1;
                    total_steps += 1;
                    continue;
                }
            };

            let basket = selector::select(&history, &universe_list, self.top_n);
            let (tradable, fractionable) = filter_tradable(self.broker.as_ref(), &basket).await;

            let (to_close, to_open) = diff_against_broker_truth(&broker_held, &universe_list, &tradable);

            if !to_close.is_empty() {
                total_steps += 1;
                if self.close_and_distribute(bucket, &to_close, &history).await.is_err() {
                    failed_steps += 1;
                }
            }

            if !to_open.is_empty() {
                total_steps += 1;
                if self
                    .open_and_distribute(bucket, &to_open, capital, &history, &fractionable)
                    .await
                    .is_err()
                {
                    failed_steps += 1;
                }
            }
        }

        if failed_steps > 0 {
            return Err(CoreError::RebalanceFailed {
                failed_count: failed_steps,
                total_count: total_steps.max(1),
                detail: "live multi-bucket strategy: one or more bucket steps failed".to_string(),
            });
        }

        let account = self
            .broker
            .get_account()
            .await
            .map_err(|e| reconciliation_failed(format!("get_account for verify_integrity: {e}")))?;
        let (ok, message) = self.ledger.verify_integrity(account.equity, &current_prices);
        if !ok {
            return Err(reconciliation_failed(message));
        }
        info!(message = %message, "integrity verified");

        self.ledger
            .snapshot(now, &current_prices)
            .map_err(|e| reconciliation_failed(format!("snapshot: {e}")))?;

        Ok(())
    }

    async fn close_and_distribute(
        &self,
        bucket: Bucket,
        to_close: &[String],
        history: &crate::market_data::BarHistory,
    ) -> Result<(), anyhow::Error> {
        // Capture pre-close qty so the liquidated size is known even after
        // the broker's position record disappears.
        let positions = self.broker.get_all_positions().await?;
        let qty_by_ticker: HashMap<String, f64> = positions
            .into_iter()
            .map(|p| (p.symbol, p.qty))
            .collect();

        let failures = execution::close(self.broker.as_ref(), to_close).await;
        for (ticker, e) in &failures {
            warn!(?bucket, ticker, error = %e, "bucket close failed");
        }

        let now = chrono::Utc::now().naive_utc();
        for ticker in to_close {
            if failures.iter().any(|(t, _)| t == ticker) {
                continue;
            }
            let shares = qty_by_ticker.get(ticker).copied().unwrap_or(0.0);
            if shares <= 0.0 {
                continue;
            }
            let price = history.last_close(ticker).unwrap_or(0.0);
            if let Err(e) = self.ledger.distribute(
                bucket,
                Side::Sell,
                ticker,
                shares,
                price,
                now,
                &HashMap::new(),
            ) {
                warn!(?bucket, ticker, error = %e, "distribute failed after close");
            }
        }

        // Per-ticker close failures are logged above but never escalate —
        // only `get_all_positions` failing outright (the `?` above) does.
        Ok(())
    }

    async fn open_and_distribute(
        &self,
        bucket: Bucket,
        to_open: &[String],
        capital: f64,
        history: &crate::market_data::BarHistory,
        fractionable: &HashMap<String, bool>,
    ) -> Result<(), anyhow::Error> {
        // Refusal condition: logged and treated as a no-op, never escalated.
        let per_pos = capital / to_open.len() as f64;
        if per_pos < 1.0 {
            warn!(?bucket, per_pos, "per-position capital below $1 minimum, skipping open leg");
            return Ok(());
        }

        let price_hints: HashMap<String, f64> = to_open
            .iter()
            .filter_map(|t| history.last_close(t).map(|p| (t.clone(), p)))
            .collect();

        let executions = execution::open(
            self.broker.as_ref(),
            to_open,
            per_pos,
            &price_hints,
            fractionable,
            true,
        )
        .await?;

        let now = chrono::Utc::now().naive_utc();
        for (ticker, execution) in &executions {
            if let Err(e) = self.ledger.distribute(
                bucket,
                Side::Buy,
                ticker,
                execution.qty,
                execution.price,
                now,
                &HashMap::new(),
            ) {
                warn!(?bucket, ticker = %ticker, error = %e, "distribute failed after open");
            }
        }

        Ok(())
    }
}

/// Broker-truth diff: the bucket's current-in-bucket set per the ledger is
/// informational only (it tells us whose capital is in which position); the
/// actual close/open set always comes from what the broker currently holds,
/// which is the merged total across all three buckets. Restricting the
/// broker set to this bucket's basket universe keeps one bucket's rebalance
/// from touching tickers that belong to another bucket's basket.
fn diff_against_broker_truth(
    broker_held: &HashMap<String, f64>,
    universe_list: &[String],
    tradable: &[String],
) -> (Vec<String>, Vec<String>) {
    let basket_set: HashSet<&String> = tradable.iter().collect();

    let bucket_broker_held: HashSet<String> = broker_held
        .keys()
        .filter(|t| universe_list.contains(t) || basket_set.contains(t))
        .cloned()
        .collect();

    let to_close: Vec<String> = bucket_broker_held
        .iter()
        .filter(|t| !basket_set.contains(t))
        .cloned()
        .collect();
    let to_open: Vec<String> = tradable
        .iter()
        .filter(|t| !bucket_broker_held.contains(t))
        .cloned()
        .collect();

    (to_close, to_open)
}

fn bucket_universe(name: &str) -> Vec<String> {
    match name {
        "low-bucket-slice" => universe::low_universe_bucket_slice(),
        other => universe::by_name(other).unwrap_or_default(),
    }
}

fn default_split_allocations(broker_equity: f64) -> HashMap<Bucket, crate::ledger::BucketAllocation> {
    Bucket::ALL
        .iter()
        .map(|&b| {
            (
                b,
                crate::ledger::BucketAllocation {
                    investors: HashMap::new(),
                    total: broker_equity * b.default_weight(),
                },
            )
        })
        .collect()
}

fn reconciliation_failed(detail: String) -> CoreError {
    CoreError::ReconciliationFailed(detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{Account, Asset, BrokerPosition, MarketClock, OrderFill, SubmittedOrder};
    use async_trait::async_trait;
    use tempfile::TempDir;

    #[test]
    fn default_split_allocations_sum_to_equity() {
        let allocations = default_split_allocations(10000.0);
        let sum: f64 = allocations.values().map(|a| a.total).sum();
        assert!((sum - 10000.0).abs() < 1e-6);
        assert_eq!(allocations[&Bucket::Low].total, 4500.0);
    }

    #[test]
    fn bucket_universe_resolves_low_slice_to_first_hundred() {
        let list = bucket_universe("low-bucket-slice");
        assert_eq!(list.len(), 100);
    }

    /// Broker holds {OLD1, OLD2}; the new basket is {OLD2, NEW1}. The diff
    /// must close only OLD1 and open only NEW1 — ledger-recorded positions
    /// play no part, per the broker-truth redesign.
    #[test]
    fn diff_against_broker_truth_closes_and_opens_by_broker_fact_alone() {
        let mut broker_held = HashMap::new();
        broker_held.insert("OLD1".to_string(), 3.0);
        broker_held.insert("OLD2".to_string(), 2.0);

        let universe_list = vec!["OLD1".to_string(), "OLD2".to_string(), "NEW1".to_string()];
        let tradable = vec!["OLD2".to_string(), "NEW1".to_string()];

        let (to_close, to_open) = diff_against_broker_truth(&broker_held, &universe_list, &tradable);
        assert_eq!(to_close, vec!["OLD1".to_string()]);
        assert_eq!(to_open, vec!["NEW1".to_string()]);
    }

    struct StubBroker {
        fail_close: bool,
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
            Ok(vec![BrokerPosition {
                symbol: "OLD1".to_string(),
                qty: 3.0,
                market_value: 300.0,
                unrealized_pl: 0.0,
            }])
        }
        async fn get_asset(&self, _symbol: &str) -> anyhow::Result<Asset> {
            unimplemented!()
        }
        async fn submit_order(
            &self,
            _symbol: &str,
            _side: crate::broker::OrderSide,
            _amount: crate::broker::OrderAmount,
        ) -> anyhow::Result<SubmittedOrder> {
            unimplemented!()
        }
        async fn get_order_by_id(&self, _id: &str) -> anyhow::Result<OrderFill> {
            unimplemented!()
        }
        async fn close_position(&self, _symbol: &str) -> anyhow::Result<()> {
            if self.fail_close {
                anyhow::bail!("close rejected by exchange")
            } else {
                Ok(())
            }
        }
    }

    fn empty_ledger(dir: &TempDir) -> Arc<Ledger> {
        Arc::new(Ledger::load(dir.path().join("investors"), dir.path().join("registry.csv")).unwrap())
    }

    #[tokio::test]
    async fn close_and_distribute_does_not_escalate_on_per_ticker_failure() {
        let dir = TempDir::new().unwrap();
        let strategy = LiveStrategy::new(Arc::new(StubBroker { fail_close: true }), empty_ledger(&dir), 5);
        let result = strategy
            .close_and_distribute(Bucket::Low, &["OLD1".to_string()], &crate::market_data::BarHistory::new())
            .await;
        assert!(result.is_ok(), "a failed close must not escalate: {result:?}");
    }

    #[tokio::test]
    async fn open_and_distribute_does_not_escalate_on_refusal() {
        let dir = TempDir::new().unwrap();
        let strategy = LiveStrategy::new(Arc::new(StubBroker { fail_close: false }), empty_ledger(&dir), 5);
        let to_open = vec!["NEW1".to_string(), "NEW2".to_string()];
        let result = strategy
            .open_and_distribute(Bucket::Low, &to_open, 1.0, &crate::market_data::BarHistory::new(), &HashMap::new())
            .await;
        assert!(result.is_ok(), "a per-position refusal must not escalate: {result:?}");
    }
}
