// =============================================================================
// Strategy (single-account) (C7)
// =============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::broker::BrokerClient;
use crate::error::CoreError;
use crate::execution::{self, Execution};
use crate::market_data::MarketDataLoader;
use crate::selector;
use crate::tradability::filter_tradable;

/// One single-account entry in the strategy fleet. Owns a broker client and
/// targets a fixed universe with a fixed top-N basket size.
pub struct Strategy {
    pub name: String,
    pub broker: Arc<dyn BrokerClient>,
    pub universe: Vec<String>,
    pub top_n: usize,
}

impl Strategy {
    pub fn new(
        name: impl Into<String>,
        broker: Arc<dyn BrokerClient>,
        universe: Vec<String>,
        top_n: usize,
    ) -> Self {
        Self {
            name: name.into(),
            broker,
            universe,
            top_n,
        }
    }

    /// Select the new target basket, diff it against current broker
    /// positions, close what fell out and open what's new.
    ///
    /// Per-ticker order failures (a single `close`/`open` leg) and refusal
    /// conditions (no cash, per-position below $1) are logged and never
    /// escalate — a strategy with any such failure still counts as
    /// completed for the day's rebalance flag. Only a failure in a step
    /// outside the close/open execution loop itself (`get_all_positions`,
    /// `loader.load`, or the account lookup that sizes the open leg)
    /// escalates to a single `RebalanceFailed`.
    pub async fn rebalance(&self, loader: &MarketDataLoader) -> Result<(), CoreError> {
        let history = loader.load(&self.universe).await?;
        let basket = selector::select(&history, &self.universe, self.top_n);

        let (tradable, fractionable) = filter_tradable(self.broker.as_ref(), &basket).await;
        let basket_set: HashSet<&String> = tradable.iter().collect();

        let current_positions = self
            .broker
            .get_all_positions()
            .await
            .map_err(|e| rebalance_failed(&self.name, 1, 1, format!("get_all_positions: {e}")))?;
        let current: HashSet<String> = current_positions
            .iter()
            .filter(|p| p.qty > 0.0)
            .map(|p| p.symbol.clone())
            .collect();

        let to_close: Vec<String> = current
            .iter()
            .filter(|s| !basket_set.contains(s))
            .cloned()
            .collect();
        let to_open: Vec<String> = tradable
            .iter()
            .filter(|s| !current.contains(*s))
            .cloned()
            .collect();

        let mut failed_steps = 0usize;
        let mut total_steps = 0usize;

        if !to_close.is_empty() {
            total_steps += 1;
            let failures = execution::close(self.broker.as_ref(), &to_close).await;
            for (ticker, e) in &failures {
                error!(strategy = %self.name, ticker, error = %e, "close failed");
            }
            // Per-ticker close failures are logged but never escalate —
            // §7: a strategy with any `OrderFailed` still counts as
            // completed for the day's rebalance flag.
        }

        if !to_open.is_empty() {
            total_steps += 1;
            if let Err(e) = self.open_basket(&to_open, &history, &fractionable).await {
                failed_steps += 1;
                error!(strategy = %self.name, error = %e, "open leg failed outside refusal handling");
            }
        }

        if failed_steps > 0 {
            return Err(rebalance_failed(
                &self.name,
                failed_steps,
                total_steps.max(1),
                "one or more execution steps failed".to_string(),
            ));
        }

        info!(
            strategy = %self.name,
            closed = to_close.len(),
            opened = to_open.len(),
            "rebalance complete"
        );
        Ok(())
    }

    /// Refusal conditions (no cash, per-position below $1) are logged and
    /// treated as a no-op — they return `Ok(())`, not an error, so they
    /// never escalate. Only the account lookup or the execution call
    /// itself failing propagates an `Err` here.
    async fn open_basket(
        &self,
        to_open: &[String],
        history: &crate::market_data::BarHistory,
        fractionable: &HashMap<String, bool>,
    ) -> Result<(), anyhow::Error> {
        let account = self.broker.get_account().await?;
        if account.cash <= 0.0 {
            warn!(strategy = %self.name, "no cash available to open positions, skipping open leg");
            return Ok(());
        }

        let per_pos = account.cash / to_open.len() as f64;
        if per_pos < 1.0 {
            warn!(strategy = %self.name, per_pos, "per-position cash below $1 minimum, skipping open leg");
            return Ok(());
        }

        let price_hints: HashMap<String, f64> = to_open
            .iter()
            .filter_map(|t| history.last_close(t).map(|p| (t.clone(), p)))
            .collect();

        let executed: Vec<(String, Execution)> = execution::open(
            self.broker.as_ref(),
            to_open,
            per_pos,
            &price_hints,
            fractionable,
            false,
        )
        .await?;

        info!(strategy = %self.name, opened = executed.len(), "open leg complete");
        Ok(())
    }
}

fn rebalance_failed(name: &str, failed: usize, total: usize, detail: String) -> CoreError {
    CoreError::RebalanceFailed {
        failed_count: failed,
        total_count: total,
        detail: format!("strategy '{name}': {detail}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{Account, Asset, BrokerPosition, MarketClock, OrderFill, SubmittedOrder};
    use crate::config::MarketDataConfig;
    use crate::market_data::{BarHistory, DataProvider};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn rebalance_failed_names_the_strategy() {
        let e = rebalance_failed("low-risk", 1, 2, "boom".to_string());
        assert!(e.to_string().contains("1 of 2"));
        if let CoreError::RebalanceFailed { detail, .. } = e {
            assert!(detail.contains("low-risk"));
        } else {
            panic!("expected RebalanceFailed");
        }
    }

    struct ConstantProvider;

    #[async_trait]
    impl DataProvider for ConstantProvider {
        async fn download(&self, tickers: &[String], _period_days: u32) -> anyhow::Result<BarHistory> {
            let mut history = BarHistory::new();
            for ticker in tickers {
                history.insert_close(ticker, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), 100.0);
                history.insert_close(ticker, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(), 110.0);
            }
            Ok(history)
        }
    }

    /// Holds one stale position (`OLD`, not in the new basket) whose close
    /// always fails, and reports zero cash so the open leg hits the
    /// refusal path. Neither should escalate to `RebalanceFailed`.
    struct StubBroker;

    #[async_trait]
    impl BrokerClient for StubBroker {
        async fn get_clock(&self) -> anyhow::Result<MarketClock> {
            unimplemented!()
        }
        async fn get_account(&self) -> anyhow::Result<Account> {
            Ok(Account { cash: 0.0, equity: 0.0, portfolio_value: 0.0 })
        }
        async fn get_all_positions(&self) -> anyhow::Result<Vec<BrokerPosition>> {
            Ok(vec![BrokerPosition {
                symbol: "OLD".to_string(),
                qty: 5.0,
                market_value: 500.0,
                unrealized_pl: 0.0,
            }])
        }
        async fn get_asset(&self, _symbol: &str) -> anyhow::Result<Asset> {
            Ok(Asset { tradable: true, fractionable: true, active: true })
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
            anyhow::bail!("close rejected by exchange")
        }
    }

    #[tokio::test]
    async fn close_failure_and_open_refusal_do_not_escalate() {
        let dir = TempDir::new().unwrap();
        let loader = MarketDataLoader::new(
            Arc::new(ConstantProvider),
            MarketDataConfig {
                cache_path: dir.path().join("cache.json").to_string_lossy().into_owned(),
                cache_ttl_hours: 24,
                period_days: 365,
                max_retries: 1,
                retry_delay_secs: 0,
                enable_retry: false,
            },
        );

        let strategy = Strategy::new(
            "test-strategy",
            Arc::new(StubBroker),
            vec!["NEW".to_string()],
            1,
        );

        let result = strategy.rebalance(&loader).await;
        assert!(result.is_ok(), "close failure and cash refusal must not escalate: {result:?}");
    }
}
