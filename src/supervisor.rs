// =============================================================================
// Scheduler / Supervisor (C10)
// =============================================================================
//
// A single `Supervisor` value, constructed once at startup, owns every
// capability the scheduled jobs need: the strategy fleet, the ledger, the
// notifier, the rebalance-flag store, and the market-data loader. It is
// wrapped in `Arc` and handed into each `tokio::spawn`ed job closure — the
// same central-aggregator-plus-cheap-Arc-clone pattern this codebase already
// uses for its shared state, minus the dashboard/websocket surface that
// pattern also carried, which this engine has no use for.
// =============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::broker::BrokerClient;
use crate::clock::Clock;
use crate::config::RuntimeConfig;
use crate::error::CoreError;
use crate::ledger::Ledger;
use crate::live_strategy::LiveStrategy;
use crate::market_data::MarketDataLoader;
use crate::notifier::{BasketPreview, Notifier};
use crate::rebalance_flag::RebalanceFlagStore;
use crate::strategy::Strategy;
use crate::types::Environment;

const REBALANCE_INTERVAL_DAYS: u32 = 22;

pub struct Supervisor {
    pub environment: Environment,
    pub clock: Clock,
    pub strategies: Vec<Strategy>,
    pub live_strategy: Option<LiveStrategy>,
    pub ledger: Option<Arc<Ledger>>,
    pub notifier: Arc<dyn Notifier>,
    pub flag_store: RebalanceFlagStore,
    pub loader: Arc<MarketDataLoader>,
    pub market_clock_broker: Option<Arc<dyn BrokerClient>>,
    confirmation_tx: watch::Sender<Option<bool>>,
    confirmation_rx: watch::Receiver<Option<bool>>,
    confirmation_timeout: std::time::Duration,
    /// Set on shutdown; job loops check this between ticks and exit cleanly
    /// rather than being aborted mid-iteration.
    shutting_down: AtomicBool,
}

impl Supervisor {
    pub fn new(
        strategies: Vec<Strategy>,
        live_strategy: Option<LiveStrategy>,
        ledger: Option<Arc<Ledger>>,
        notifier: Arc<dyn Notifier>,
        flag_store: RebalanceFlagStore,
        loader: Arc<MarketDataLoader>,
        market_clock_broker: Option<Arc<dyn BrokerClient>>,
        config: &RuntimeConfig,
    ) -> Arc<Self> {
        let (confirmation_tx, confirmation_rx) = watch::channel(None);
        Arc::new(Self {
            environment: config.environment,
            clock: Clock::new(),
            strategies,
            live_strategy,
            ledger,
            notifier,
            flag_store,
            loader,
            market_clock_broker,
            confirmation_tx,
            confirmation_rx,
            confirmation_timeout: std::time::Duration::from_secs(config.notifier.confirmation_timeout_secs),
            shutting_down: AtomicBool::new(false),
        })
    }

    /// Called by an external admin channel (not modeled here — a future
    /// inbound transport would call this) to answer a pending confirmation.
    pub fn answer_confirmation(&self, approve: bool) {
        let _ = self.confirmation_tx.send(Some(approve));
    }

    /// Marks the scheduler for shutdown. Job loops observe this between
    /// ticks and exit once their current tick (if any) completes, rather
    /// than being cancelled mid-rebalance.
    pub fn request_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    fn days_until_rebalance(&self, today: NaiveDate) -> u32 {
        match self.flag_store.last_date() {
            None => 0,
            Some(last) => {
                let elapsed = self.clock.trading_days_between(last, today);
                REBALANCE_INTERVAL_DAYS.saturating_sub(elapsed)
            }
        }
    }

    async fn market_is_open(&self) -> bool {
        match &self.market_clock_broker {
            Some(broker) => match broker.get_clock().await {
                Ok(clock) => clock.is_open,
                Err(e) => {
                    warn!(error = %e, "broker clock check failed, assuming closed");
                    false
                }
            },
            None => true,
        }
    }

    async fn wait_for_confirmation(&self) -> bool {
        let mut rx = self.confirmation_rx.clone();
        let wait = tokio::time::timeout(self.confirmation_timeout, async {
            loop {
                if let Some(answer) = *rx.borrow() {
                    return answer;
                }
                if rx.changed().await.is_err() {
                    return false;
                }
            }
        });

        match wait.await {
            Ok(answer) => answer,
            Err(_) => {
                warn!("confirmation request timed out, treating as rejected");
                false
            }
        }
    }

    /// Runs every enabled strategy's rebalance, collecting per-strategy
    /// failures rather than stopping at the first one.
    async fn run_all_rebalances(&self) -> Result<(), CoreError> {
        let today = self.clock.today();
        let mut failed = 0usize;
        let mut total = 0usize;
        let mut details = Vec::new();

        for strategy in &self.strategies {
            total += 1;
            if let Err(e) = strategy.rebalance(&self.loader).await {
                failed += 1;
                error!(strategy = %strategy.name, error = %e, "strategy rebalance failed");
                details.push(format!("{}: {e}", strategy.name));
            }
        }

        if let Some(live) = &self.live_strategy {
            total += 1;
            if let Err(e) = live.rebalance(&self.loader, today).await {
                failed += 1;
                error!(error = %e, "live multi-bucket rebalance failed");
                details.push(format!("live: {e}"));
            }
        }

        if failed > 0 {
            return Err(CoreError::RebalanceFailed {
                failed_count: failed,
                total_count: total.max(1),
                detail: details.join("; "),
            });
        }

        Ok(())
    }

    /// Daily rebalance trigger job body: checks the three sequential
    /// preconditions, then branches on environment before executing.
    pub async fn daily_rebalance_tick(self: &Arc<Self>) {
        let today = self.clock.today();

        if self.flag_store.rebalanced_on(today) {
            return;
        }
        if !self.market_is_open().await {
            return;
        }
        if self.days_until_rebalance(today) != 0 {
            return;
        }

        let previews: Vec<BasketPreview> = self
            .strategies
            .iter()
            .map(|s| BasketPreview {
                bucket: None,
                strategy_name: s.name.clone(),
                to_close: Vec::new(),
                to_open: Vec::new(),
            })
            .collect();

        let should_execute = match self.environment {
            Environment::Prod => true,
            Environment::Local => {
                self.notifier.send_confirmation_request(&previews).await;
                self.wait_for_confirmation().await
            }
        };

        if !should_execute {
            info!("rebalance skipped: confirmation not received");
            return;
        }

        match self.run_all_rebalances().await {
            Ok(()) => {
                if let Err(e) = self.flag_store.write(today) {
                    error!(error = %e, "failed to persist rebalance flag after success");
                }
                info!(date = %today, "daily rebalance complete");
            }
            Err(e) => {
                self.notifier.send_error("rebalance failed", &e.to_string(), false).await;
            }
        }
    }

    /// Post-close snapshot job body: 16:30 NY weekdays.
    pub async fn post_close_snapshot_tick(self: &Arc<Self>) {
        let Some(ledger) = &self.ledger else {
            return;
        };
        let today = self.clock.today();
        if let Err(e) = ledger.snapshot(today, &std::collections::HashMap::new()) {
            error!(error = %e, "post-close snapshot failed");
            self.notifier.send_error("snapshot failed", &e.to_string(), true).await;
        }
    }

    /// Integrity watchdog job body: hourly, escalates on failure as a
    /// non-warning condition.
    pub async fn integrity_watchdog_tick(self: &Arc<Self>) {
        let (Some(ledger), Some(broker)) = (&self.ledger, &self.market_clock_broker) else {
            return;
        };
        let account = match broker.get_account().await {
            Ok(a) => a,
            Err(e) => {
                warn!(error = %e, "integrity watchdog could not read broker account");
                return;
            }
        };
        let (ok, message) = ledger.verify_integrity(account.equity, &std::collections::HashMap::new());
        if !ok {
            self.notifier.send_error("integrity check failed", &message, false).await;
        }
    }

    /// Startup job body: pre-warms the market-data cache for every strategy's
    /// universe and, if the market is currently open, runs one immediate
    /// rebalance subject to the same preconditions as the daily trigger.
    pub async fn startup(self: &Arc<Self>) {
        for strategy in &self.strategies {
            if let Err(e) = self.loader.load(&strategy.universe).await {
                warn!(strategy = %strategy.name, error = %e, "startup pre-warm failed");
            }
        }

        self.notifier
            .send_startup(&format!("engine started with {} strategies", self.strategies.len()))
            .await;

        if self.market_is_open().await {
            self.daily_rebalance_tick().await;
        }
    }
}

/// Spawns the scheduler's independent job loops. Each loop retries its own
/// tick on failure rather than aborting the process; a panic in one loop
/// never takes down another. Loops exit cleanly once `request_shutdown` is
/// observed between ticks, so a caller can `join` the returned handles for a
/// graceful drain instead of aborting them.
pub fn spawn_jobs(supervisor: Arc<Supervisor>) -> Vec<tokio::task::JoinHandle<()>> {
    let mut handles = Vec::new();

    {
        let supervisor = supervisor.clone();
        handles.push(tokio::spawn(async move {
            supervisor.startup().await;

            let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
            while !supervisor.is_shutting_down() {
                interval.tick().await;
                if supervisor.is_shutting_down() {
                    break;
                }
                let now = supervisor.clock.now();
                if now.hour_is_ten() {
                    supervisor.daily_rebalance_tick().await;
                }
            }
        }));
    }

    {
        let supervisor = supervisor.clone();
        handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
            while !supervisor.is_shutting_down() {
                interval.tick().await;
                if supervisor.is_shutting_down() {
                    break;
                }
                let now = supervisor.clock.now();
                if now.hour_is_sixteen_thirty() {
                    supervisor.post_close_snapshot_tick().await;
                }
            }
        }));
    }

    {
        let supervisor = supervisor.clone();
        handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
            while !supervisor.is_shutting_down() {
                interval.tick().await;
                if supervisor.is_shutting_down() {
                    break;
                }
                supervisor.integrity_watchdog_tick().await;
            }
        }));
    }

    handles
}

trait NyHourCheck {
    fn hour_is_ten(&self) -> bool;
    fn hour_is_sixteen_thirty(&self) -> bool;
}

impl NyHourCheck for chrono::DateTime<chrono_tz::Tz> {
    fn hour_is_ten(&self) -> bool {
        use chrono::{Timelike, Weekday};
        !matches!(self.weekday(), Weekday::Sat | Weekday::Sun) && self.hour() == 10 && self.minute() < 5
    }

    fn hour_is_sixteen_thirty(&self) -> bool {
        use chrono::{Timelike, Weekday};
        !matches!(self.weekday(), Weekday::Sat | Weekday::Sun) && self.hour() == 16 && (30..35).contains(&self.minute())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_gate_matches_ten_am_window_on_weekdays() {
        use chrono::TimeZone;
        let ny = chrono_tz::America::New_York
            .with_ymd_and_hms(2026, 7, 27, 10, 2, 0)
            .unwrap();
        assert!(ny.hour_is_ten());

        let weekend = chrono_tz::America::New_York
            .with_ymd_and_hms(2026, 7, 25, 10, 2, 0)
            .unwrap();
        assert!(!weekend.hour_is_ten());
    }

    #[test]
    fn hour_gate_matches_post_close_window() {
        use chrono::TimeZone;
        let ny = chrono_tz::America::New_York
            .with_ymd_and_hms(2026, 7, 27, 16, 31, 0)
            .unwrap();
        assert!(ny.hour_is_sixteen_thirty());
    }
}
