// =============================================================================
// Investor Ledger (C8)
// =============================================================================
//
// Registry, per-investor operations/trades logs, derived balance
// reconstruction, HWM fee assessment, and broker-equity reconciliation.
// All mutating operations take the same `parking_lot::RwLock` write guard,
// matching the single-writer-per-resource concurrency idiom used for every
// other piece of shared mutable state in this codebase.
// =============================================================================

pub mod balances;
pub mod csv_io;
pub mod model;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use parking_lot::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::{Bucket, Side};

pub use model::{
    BalanceSnapshotRow, Investor, InvestorStatus, Operation, OperationKind, OperationStatus,
    Trade,
};

/// Per-bucket allocation: each active investor's total value in that
/// bucket, plus the bucket total. The pro-rata key for trade attribution.
#[derive(Debug, Clone, Default)]
pub struct BucketAllocation {
    pub investors: HashMap<String, f64>,
    pub total: f64,
}

struct LedgerState {
    investors: Vec<Investor>,
    operations: HashMap<String, Vec<Operation>>,
    trades: HashMap<String, Vec<Trade>>,
}

pub struct Ledger {
    ledger_root: PathBuf,
    registry_path: PathBuf,
    state: RwLock<LedgerState>,
}

impl Ledger {
    /// Load the registry and every active/inactive investor's logs from
    /// disk. A missing registry is not fatal — it yields an empty ledger
    /// with a warning, per §4.8.
    pub fn load(ledger_root: impl Into<PathBuf>, registry_path: impl Into<PathBuf>) -> Result<Self> {
        let ledger_root = ledger_root.into();
        let registry_path = registry_path.into();

        let investors: Vec<Investor> = match csv_io::read_rows(&registry_path) {
            Ok(rows) if !rows.is_empty() => rows,
            Ok(_) => {
                warn!(path = %registry_path.display(), "investor registry missing or empty");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %registry_path.display(), error = %e, "failed to read investor registry");
                Vec::new()
            }
        };

        let mut operations = HashMap::new();
        let mut trades = HashMap::new();
        for investor in &investors {
            let (ops_path, trades_path, _snapshot_path) = Self::paths(&ledger_root, &investor.name);
            operations.insert(
                investor.name.clone(),
                csv_io::read_rows(&ops_path).unwrap_or_default(),
            );
            trades.insert(
                investor.name.clone(),
                csv_io::read_rows(&trades_path).unwrap_or_default(),
            );
        }

        info!(investor_count = investors.len(), "ledger loaded");

        Ok(Self {
            ledger_root,
            registry_path,
            state: RwLock::new(LedgerState {
                investors,
                operations,
                trades,
            }),
        })
    }

    fn paths(ledger_root: &Path, name: &str) -> (PathBuf, PathBuf, PathBuf) {
        let dir = ledger_root.join(name);
        (
            dir.join("operations.csv"),
            dir.join("trades.csv"),
            dir.join("balances_snapshot.csv"),
        )
    }

    pub fn has_investors(&self) -> bool {
        !self.state.read().investors.is_empty()
    }

    // -------------------------------------------------------------------
    // Deposits / withdrawals
    // -------------------------------------------------------------------

    pub fn deposit(&self, name: &str, amount: f64, bucket: Option<Bucket>, now: NaiveDateTime) -> Result<Vec<String>> {
        if amount <= 0.0 {
            anyhow::bail!("deposit amount must be positive, got {amount}");
        }
        self.append_operation_splits(name, amount, bucket, OperationKind::Deposit, now)
    }

    pub fn withdraw(&self, name: &str, amount: f64, bucket: Option<Bucket>, now: NaiveDateTime) -> Result<Vec<String>> {
        if amount <= 0.0 {
            anyhow::bail!("withdraw amount must be positive, got {amount}");
        }

        let state = self.state.read();
        let ops = state.operations.get(name).cloned().unwrap_or_default();
        let trades = state.trades.get(name).cloned().unwrap_or_default();

        let available = match bucket {
            Some(b) => balances::cash_with_trades(&ops, &trades, b),
            None => Bucket::ALL
                .iter()
                .map(|&b| balances::cash_with_trades(&ops, &trades, b))
                .sum(),
        };
        drop(state);

        if amount > available {
            return Err(CoreError::InsufficientBalance {
                investor: name.to_string(),
                bucket: bucket.map(|b| b.to_string()).unwrap_or_else(|| "all".to_string()),
                requested: amount,
                available,
            }
            .into());
        }

        self.append_operation_splits(name, amount, bucket, OperationKind::Withdraw, now)
    }

    fn append_operation_splits(
        &self,
        name: &str,
        amount: f64,
        bucket: Option<Bucket>,
        kind: OperationKind,
        now: NaiveDateTime,
    ) -> Result<Vec<String>> {
        let mut state = self.state.write();
        let investor = state
            .investors
            .iter()
            .find(|i| i.name == name && i.is_active())
            .cloned()
            .ok_or_else(|| anyhow!("unknown or inactive investor '{name}'"))?;

        let splits = match bucket {
            Some(b) => vec![(b, amount)],
            None => {
                let low = round_cents(amount * Bucket::Low.default_weight());
                let medium = round_cents(amount * Bucket::Medium.default_weight());
                let high = round_cents(amount - low - medium); // exact sum, absorbs rounding
                vec![(Bucket::Low, low), (Bucket::Medium, medium), (Bucket::High, high)]
            }
        };

        let (ops_path, _, _) = Self::paths(&self.ledger_root, &investor.name);
        let mut ids = Vec::with_capacity(splits.len());

        for (split_bucket, split_amount) in splits {
            let id = Uuid::new_v4().to_string();
            let op = Operation {
                date: now.date(),
                timestamp: now,
                kind,
                bucket: split_bucket,
                amount: split_amount,
                status: OperationStatus::Pending,
                balance_after: 0.0,
                note: format!("id:{id}"),
            };
            csv_io::append_row(&ops_path, &op)
                .with_context(|| format!("failed to append operation for {name}"))?;
            state
                .operations
                .entry(investor.name.clone())
                .or_default()
                .push(op);
            ids.push(id);
        }

        Ok(ids)
    }

    // -------------------------------------------------------------------
    // Pending-operation completion
    // -------------------------------------------------------------------

    /// For every active investor, mark pending operations completed and
    /// stamp `balance_after` with the post-completion bucket cash. The
    /// whole operations file is rewritten atomically per investor.
    pub fn process_pending(&self) -> Result<usize> {
        let mut state = self.state.write();
        let mut completed_count = 0;

        let active_names: Vec<String> = state
            .investors
            .iter()
            .filter(|i| i.is_active())
            .map(|i| i.name.clone())
            .collect();

        for name in active_names {
            let Some(ops) = state.operations.get_mut(&name) else {
                continue;
            };
            if !ops.iter().any(|op| op.status == OperationStatus::Pending) {
                continue;
            }

            let trades = state.trades.get(&name).cloned().unwrap_or_default();

            // Running per-bucket cash, seeded from already-completed operations
            // and all trades, then advanced as each pending op is completed in
            // file order so `balance_after` reflects the running total at the
            // moment that specific operation settles.
            let mut running: HashMap<Bucket, f64> = Bucket::ALL
                .iter()
                .map(|&b| (b, balances::cash_with_trades(ops, &trades, b)))
                .collect();

            for op in ops.iter_mut() {
                if op.status == OperationStatus::Pending {
                    let delta = match op.kind {
                        OperationKind::Deposit => op.amount,
                        OperationKind::Withdraw | OperationKind::Fee => -op.amount,
                    };
                    let bucket_balance = running.entry(op.bucket).or_insert(0.0);
                    *bucket_balance += delta;
                    op.status = OperationStatus::Completed;
                    op.balance_after = *bucket_balance;
                    completed_count += 1;
                }
            }

            let (ops_path, _, _) = Self::paths(&self.ledger_root, &name);
            csv_io::write_rows(&ops_path, ops)
                .with_context(|| format!("failed to rewrite operations for {name}"))?;
        }

        info!(completed_count, "process_pending complete");
        Ok(completed_count)
    }

    // -------------------------------------------------------------------
    // Allocations / distribution
    // -------------------------------------------------------------------

    /// Per bucket, each active investor's total value in that bucket, and
    /// the bucket total — the pro-rata key for trade attribution. Current
    /// prices feed positions valuation; omit a ticker to fall back to its
    /// last trade price.
    pub fn allocations(&self, current_prices: &HashMap<String, f64>) -> HashMap<Bucket, BucketAllocation> {
        let state = self.state.read();
        let mut result = HashMap::new();

        for &bucket in &Bucket::ALL {
            let mut alloc = BucketAllocation::default();
            for investor in state.investors.iter().filter(|i| i.is_active()) {
                let ops = state.operations.get(&investor.name).cloned().unwrap_or_default();
                let trades = state.trades.get(&investor.name).cloned().unwrap_or_default();
                let value = balances::cash_with_trades(&ops, &trades, bucket)
                    + balances::positions_value(&trades, bucket, current_prices);
                alloc.investors.insert(investor.name.clone(), value);
                alloc.total += value;
            }
            result.insert(bucket, alloc);
        }

        result
    }

    /// Attribute a broker-level fill pro-rata across active investors by
    /// their share of `bucket`'s total capital, appending one trade-lot row
    /// per investor with positive share. Skips (with a warning) if the
    /// bucket's total capital is ≤ 0.
    pub fn distribute(
        &self,
        bucket: Bucket,
        side: Side,
        ticker: &str,
        total_shares: f64,
        price: f64,
        now: NaiveDateTime,
        current_prices: &HashMap<String, f64>,
    ) -> Result<()> {
        let alloc = self.allocations(current_prices);
        let Some(bucket_alloc) = alloc.get(&bucket) else {
            return Ok(());
        };

        if bucket_alloc.total <= 0.0 {
            warn!(?bucket, "distribute skipped: bucket total capital <= 0");
            return Ok(());
        }

        let mut state = self.state.write();
        for (investor_name, capital) in &bucket_alloc.investors {
            if *capital <= 0.0 {
                continue;
            }
            let share_fraction = capital / bucket_alloc.total;
            let shares = total_shares * share_fraction;
            let amount = shares * price;

            let trades = state.trades.entry(investor_name.clone()).or_default();
            let prior_cumulative = trades
                .iter()
                .filter(|t| t.bucket == bucket && t.ticker == ticker)
                .last()
                .map(|t| t.cumulative_shares_after)
                .unwrap_or(0.0);
            let cumulative_shares_after = match side {
                Side::Buy => prior_cumulative + shares,
                Side::Sell => prior_cumulative - shares,
            };

            let trade = Trade {
                date: now.date(),
                timestamp: now,
                bucket,
                side,
                ticker: ticker.to_string(),
                shares,
                price,
                amount,
                cumulative_shares_after,
                note: String::new(),
            };

            let (_, trades_path, _) = Self::paths(&self.ledger_root, investor_name);
            csv_io::append_row(&trades_path, &trade)
                .with_context(|| format!("failed to append trade for {investor_name}"))?;
            trades.push(trade);
        }

        Ok(())
    }

    // -------------------------------------------------------------------
    // Fees
    // -------------------------------------------------------------------

    /// HWM-based fee assessment. `at_rebalance` gates on a monthly cadence
    /// (`last_fee_date` at least a month stale); called from a withdrawal
    /// path it always evaluates. Persists registry changes.
    pub fn fees(
        &self,
        at_rebalance: bool,
        only: Option<&str>,
        now: NaiveDate,
        current_prices: &HashMap<String, f64>,
    ) -> Result<HashMap<String, f64>> {
        let mut state = self.state.write();
        let mut fees = HashMap::new();

        let candidates: Vec<usize> = state
            .investors
            .iter()
            .enumerate()
            .filter(|(_, i)| i.is_active() && !i.is_fee_receiver)
            .filter(|(_, i)| only.map_or(true, |name| i.name == name))
            .map(|(idx, _)| idx)
            .collect();

        for idx in candidates {
            let (name, last_fee_date, high_watermark) = {
                let i = &state.investors[idx];
                (i.name.clone(), i.last_fee_date, i.high_watermark)
            };

            if at_rebalance {
                let due = match last_fee_date {
                    None => true,
                    Some(last) => months_between(last, now) >= 1,
                };
                if !due {
                    continue;
                }
            }

            let ops = state.operations.get(&name).cloned().unwrap_or_default();
            let trades = state.trades.get(&name).cloned().unwrap_or_default();
            let current = balances::total_value(&ops, &trades, current_prices);

            if current > high_watermark {
                let fee_percent = state.investors[idx].fee_percent;
                let fee = (current - high_watermark) * fee_percent;
                if fee > 0.0 {
                    state.investors[idx].high_watermark = current;
                    if at_rebalance {
                        state.investors[idx].last_fee_date = Some(now);
                    }
                    fees.insert(name, fee);
                }
            }
        }

        if !fees.is_empty() {
            csv_io::write_rows(&self.registry_path, &state.investors)
                .context("failed to persist registry after fee assessment")?;
        }

        info!(fee_count = fees.len(), at_rebalance, "fee assessment complete");
        Ok(fees)
    }

    // -------------------------------------------------------------------
    // Reconciliation / snapshot
    // -------------------------------------------------------------------

    /// Compare the sum of active investors' total value against the
    /// broker's reported equity. Passes iff the absolute difference is at
    /// most $1. The signed diff is always included in the returned
    /// message, even on success, to keep the derivation gap observable.
    pub fn verify_integrity(&self, broker_equity: f64, current_prices: &HashMap<String, f64>) -> (bool, String) {
        let state = self.state.read();
        let total: f64 = state
            .investors
            .iter()
            .filter(|i| i.is_active())
            .map(|i| {
                let ops = state.operations.get(&i.name).cloned().unwrap_or_default();
                let trades = state.trades.get(&i.name).cloned().unwrap_or_default();
                balances::total_value(&ops, &trades, current_prices)
            })
            .sum();

        let diff = total - broker_equity;
        let ok = diff.abs() <= 1.0;
        let message = format!(
            "ledger total {total:.2} vs broker equity {broker_equity:.2}, diff {diff:+.2}"
        );
        (ok, message)
    }

    /// Append a daily per-bucket balance row for each active investor.
    pub fn snapshot(&self, date: NaiveDate, current_prices: &HashMap<String, f64>) -> Result<()> {
        let state = self.state.read();
        for investor in state.investors.iter().filter(|i| i.is_active()) {
            let ops = state.operations.get(&investor.name).cloned().unwrap_or_default();
            let trades = state.trades.get(&investor.name).cloned().unwrap_or_default();
            let (_, _, snapshot_path) = Self::paths(&self.ledger_root, &investor.name);

            for &bucket in &Bucket::ALL {
                let cash = balances::cash_with_trades(&ops, &trades, bucket);
                let positions_value = balances::positions_value(&trades, bucket, current_prices);
                let unrealized_pnl = balances::unrealized_pnl(&trades, bucket, current_prices);
                let realized_pnl = balances::realized_pnl(&trades, bucket);
                let row = BalanceSnapshotRow {
                    date,
                    bucket,
                    cash,
                    positions_value,
                    unrealized_pnl,
                    realized_pnl,
                    total_value: cash + positions_value,
                };
                csv_io::append_row(&snapshot_path, &row)
                    .with_context(|| format!("failed to append snapshot row for {}", investor.name))?;
            }
        }
        Ok(())
    }
}

fn round_cents(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn months_between(a: NaiveDate, b: NaiveDate) -> i32 {
    (b.year() - a.year()) * 12 + (b.month() as i32 - a.month() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 7, 27)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn seed_ledger(dir: &TempDir) -> Ledger {
        let registry_path = dir.path().join("investors_registry.csv");
        let investor = Investor {
            name: "Cherry".to_string(),
            creation_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            fee_percent: 0.20,
            is_fee_receiver: false,
            high_watermark: 0.0,
            last_fee_date: None,
            status: InvestorStatus::Active,
        };
        csv_io::write_rows(&registry_path, &[investor]).unwrap();
        Ledger::load(dir.path().join("investors"), registry_path).unwrap()
    }

    #[test]
    fn default_split_deposit_sums_exactly_and_uses_default_weights() {
        let dir = TempDir::new().unwrap();
        let ledger = seed_ledger(&dir);

        let ids = ledger.deposit("Cherry", 10000.00, None, now()).unwrap();
        assert_eq!(ids.len(), 3);

        let state = ledger.state.read();
        let ops = &state.operations["Cherry"];
        assert_eq!(ops.len(), 3);
        let low = ops.iter().find(|o| o.bucket == Bucket::Low).unwrap();
        let medium = ops.iter().find(|o| o.bucket == Bucket::Medium).unwrap();
        let high = ops.iter().find(|o| o.bucket == Bucket::High).unwrap();
        assert_eq!(low.amount, 4500.00);
        assert_eq!(medium.amount, 3500.00);
        assert_eq!(high.amount, 2000.00);
        assert_eq!(low.amount + medium.amount + high.amount, 10000.00);
    }

    #[test]
    fn withdraw_fails_with_insufficient_balance_when_over_available() {
        let dir = TempDir::new().unwrap();
        let ledger = seed_ledger(&dir);
        let result = ledger.withdraw("Cherry", 500.0, Some(Bucket::Low), now());
        assert!(result.is_err());
    }

    #[test]
    fn process_pending_marks_completed_and_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let ledger = seed_ledger(&dir);
        ledger.deposit("Cherry", 1000.0, Some(Bucket::Low), now()).unwrap();

        let completed = ledger.process_pending().unwrap();
        assert_eq!(completed, 1);

        let state = ledger.state.read();
        let ops = &state.operations["Cherry"];
        assert_eq!(ops[0].status, OperationStatus::Completed);
        assert_eq!(ops[0].balance_after, 1000.0);
    }

    #[test]
    fn allocations_sum_matches_bucket_total_exactly() {
        let dir = TempDir::new().unwrap();
        let ledger = seed_ledger(&dir);
        ledger.deposit("Cherry", 1000.0, Some(Bucket::Low), now()).unwrap();
        ledger.process_pending().unwrap();

        let alloc = ledger.allocations(&HashMap::new());
        let low = &alloc[&Bucket::Low];
        let sum: f64 = low.investors.values().sum();
        assert_eq!(sum, low.total);
    }

    #[test]
    fn verify_integrity_reports_diff_even_on_success() {
        let dir = TempDir::new().unwrap();
        let ledger = seed_ledger(&dir);
        let (ok, message) = ledger.verify_integrity(0.0, &HashMap::new());
        assert!(ok);
        assert!(message.contains("diff"));
    }

    fn investor(name: &str, high_watermark: f64) -> Investor {
        Investor {
            name: name.to_string(),
            creation_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            fee_percent: 0.20,
            is_fee_receiver: false,
            high_watermark,
            last_fee_date: None,
            status: InvestorStatus::Active,
        }
    }

    #[test]
    fn distribute_splits_pro_rata_by_bucket_capital_share() {
        let dir = TempDir::new().unwrap();
        let registry_path = dir.path().join("investors_registry.csv");
        let investors = vec![investor("Alexey", 0.0), investor("Alex", 0.0), investor("Cherry", 0.0)];
        csv_io::write_rows(&registry_path, &investors).unwrap();
        let ledger = Ledger::load(dir.path().join("investors"), registry_path).unwrap();

        ledger.deposit("Alexey", 4500.0, Some(Bucket::Low), now()).unwrap();
        ledger.deposit("Alex", 2250.0, Some(Bucket::Low), now()).unwrap();
        ledger.deposit("Cherry", 4500.0, Some(Bucket::Low), now()).unwrap();
        ledger.process_pending().unwrap();

        ledger
            .distribute(Bucket::Low, Side::Buy, "AAPL", 10.0, 100.00, now(), &HashMap::new())
            .unwrap();

        let state = ledger.state.read();
        let shares_for = |name: &str| {
            state.trades[name]
                .iter()
                .find(|t| t.ticker == "AAPL")
                .unwrap()
                .cumulative_shares_after
        };
        assert_eq!(shares_for("Alexey"), 4.0);
        assert_eq!(shares_for("Alex"), 2.0);
        assert_eq!(shares_for("Cherry"), 4.0);

        for name in ["Alexey", "Alex", "Cherry"] {
            let trade = state.trades[name].iter().find(|t| t.ticker == "AAPL").unwrap();
            assert_eq!(trade.price, 100.00);
        }
        assert_eq!(
            state.trades["Alexey"][0].amount + state.trades["Alex"][0].amount + state.trades["Cherry"][0].amount,
            1000.00
        );
    }

    #[test]
    fn fees_assesses_hwm_fee_on_withdrawal_path_exactly() {
        let dir = TempDir::new().unwrap();
        let registry_path = dir.path().join("investors_registry.csv");
        csv_io::write_rows(&registry_path, &[investor("Cherry", 10000.0)]).unwrap();
        let ledger = Ledger::load(dir.path().join("investors"), registry_path).unwrap();

        ledger.deposit("Cherry", 12000.0, Some(Bucket::Low), now()).unwrap();
        ledger.process_pending().unwrap();

        let fees = ledger.fees(false, Some("Cherry"), now().date(), &HashMap::new()).unwrap();
        assert_eq!(fees["Cherry"], 400.00);

        let state = ledger.state.read();
        let cherry = state.investors.iter().find(|i| i.name == "Cherry").unwrap();
        assert_eq!(cherry.high_watermark, 12000.0);
        assert_eq!(cherry.last_fee_date, None);
    }
}
