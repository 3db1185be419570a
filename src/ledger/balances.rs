// =============================================================================
// Derived balances — §3 "Derived balances"
// =============================================================================
//
// Pure functions over an investor's operation/trade logs. Never stored as
// source of truth — recomputed on demand from the append-only logs.
// =============================================================================

use std::collections::HashMap;

use crate::types::{Bucket, Side};

use super::model::{Operation, OperationKind, OperationStatus, Trade};

/// Full cash formula: completed deposits/withdrawals/fees, minus BUY
/// amounts, plus SELL amounts, restricted to `bucket`.
pub fn cash_with_trades(operations: &[Operation], trades: &[Trade], bucket: Bucket) -> f64 {
    let op_component: f64 = operations
        .iter()
        .filter(|op| op.bucket == bucket && op.status == OperationStatus::Completed)
        .map(|op| match op.kind {
            OperationKind::Deposit => op.amount,
            OperationKind::Withdraw | OperationKind::Fee => -op.amount,
        })
        .sum();

    let trade_component: f64 = trades
        .iter()
        .filter(|t| t.bucket == bucket)
        .map(|t| match t.side {
            Side::Buy => -t.amount,
            Side::Sell => t.amount,
        })
        .sum();

    op_component + trade_component
}

/// Current share count for (bucket, ticker): the last `cumulative_shares_after`
/// recorded for that pair, or 0 if never traded.
pub fn position_shares(trades: &[Trade], bucket: Bucket, ticker: &str) -> f64 {
    trades
        .iter()
        .filter(|t| t.bucket == bucket && t.ticker == ticker)
        .last()
        .map(|t| t.cumulative_shares_after)
        .unwrap_or(0.0)
}

/// All tickers with a non-zero position in `bucket`.
pub fn held_tickers(trades: &[Trade], bucket: Bucket) -> Vec<String> {
    let mut seen: HashMap<String, f64> = HashMap::new();
    for t in trades.iter().filter(|t| t.bucket == bucket) {
        seen.insert(t.ticker.clone(), t.cumulative_shares_after);
    }
    seen.into_iter()
        .filter(|(_, shares)| *shares > 0.0)
        .map(|(ticker, _)| ticker)
        .collect()
}

/// Market value of all open positions in `bucket`, using `current_prices`
/// where available and falling back to each ticker's last trade price
/// otherwise, per §3.
pub fn positions_value(
    trades: &[Trade],
    bucket: Bucket,
    current_prices: &HashMap<String, f64>,
) -> f64 {
    held_tickers(trades, bucket)
        .into_iter()
        .map(|ticker| {
            let shares = position_shares(trades, bucket, &ticker);
            let price = current_prices
                .get(&ticker)
                .copied()
                .unwrap_or_else(|| last_trade_price(trades, bucket, &ticker).unwrap_or(0.0));
            shares * price
        })
        .sum()
}

fn last_trade_price(trades: &[Trade], bucket: Bucket, ticker: &str) -> Option<f64> {
    trades
        .iter()
        .filter(|t| t.bucket == bucket && t.ticker == ticker)
        .last()
        .map(|t| t.price)
}

/// Average-cost-basis realized P&L for (bucket, ticker): on each SELL,
/// `(sell_price - running_avg_cost) * shares` is added; the cost basis
/// shrinks by `shares * running_avg_cost`. Preserved exactly as specified —
/// not FIFO.
fn realized_pnl_for_ticker(trades: &[Trade], bucket: Bucket, ticker: &str) -> f64 {
    let mut running_shares = 0.0_f64;
    let mut running_cost_basis = 0.0_f64; // total cost of currently-held shares
    let mut realized = 0.0_f64;

    for t in trades.iter().filter(|t| t.bucket == bucket && t.ticker == ticker) {
        match t.side {
            Side::Buy => {
                running_shares += t.shares;
                running_cost_basis += t.amount;
            }
            Side::Sell => {
                let avg_cost = if running_shares > 0.0 {
                    running_cost_basis / running_shares
                } else {
                    0.0
                };
                realized += (t.price - avg_cost) * t.shares;
                running_cost_basis -= t.shares * avg_cost;
                running_shares -= t.shares;
            }
        }
    }

    realized
}

pub fn realized_pnl(trades: &[Trade], bucket: Bucket) -> f64 {
    held_and_traded_tickers(trades, bucket)
        .into_iter()
        .map(|ticker| realized_pnl_for_ticker(trades, bucket, &ticker))
        .sum()
}

/// Unrealized P&L for currently-held tickers in `bucket`: for each ticker
/// still held, `(current_price - running_avg_cost) * current_shares`.
pub fn unrealized_pnl(
    trades: &[Trade],
    bucket: Bucket,
    current_prices: &HashMap<String, f64>,
) -> f64 {
    held_tickers(trades, bucket)
        .into_iter()
        .map(|ticker| {
            let (avg_cost, shares) = running_avg_cost_and_shares(trades, bucket, &ticker);
            let price = current_prices
                .get(&ticker)
                .copied()
                .unwrap_or_else(|| last_trade_price(trades, bucket, &ticker).unwrap_or(avg_cost));
            (price - avg_cost) * shares
        })
        .sum()
}

fn running_avg_cost_and_shares(trades: &[Trade], bucket: Bucket, ticker: &str) -> (f64, f64) {
    let mut running_shares = 0.0_f64;
    let mut running_cost_basis = 0.0_f64;

    for t in trades.iter().filter(|t| t.bucket == bucket && t.ticker == ticker) {
        match t.side {
            Side::Buy => {
                running_shares += t.shares;
                running_cost_basis += t.amount;
            }
            Side::Sell => {
                let avg_cost = if running_shares > 0.0 {
                    running_cost_basis / running_shares
                } else {
                    0.0
                };
                running_cost_basis -= t.shares * avg_cost;
                running_shares -= t.shares;
            }
        }
    }

    let avg_cost = if running_shares > 0.0 {
        running_cost_basis / running_shares
    } else {
        0.0
    };
    (avg_cost, running_shares)
}

fn held_and_traded_tickers(trades: &[Trade], bucket: Bucket) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for t in trades.iter().filter(|t| t.bucket == bucket) {
        if seen.insert(t.ticker.clone()) {
            out.push(t.ticker.clone());
        }
    }
    out
}

/// `total_value(investor) = Σ_bucket (cash + positions_value)`.
pub fn total_value(
    operations: &[Operation],
    trades: &[Trade],
    current_prices: &HashMap<String, f64>,
) -> f64 {
    Bucket::ALL
        .iter()
        .map(|&bucket| {
            cash_with_trades(operations, trades, bucket)
                + positions_value(trades, bucket, current_prices)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::model::OperationStatus;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ts(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
        date(y, m, d).and_hms_opt(12, 0, 0).unwrap()
    }

    fn trade(bucket: Bucket, side: Side, ticker: &str, shares: f64, price: f64, cum: f64) -> Trade {
        Trade {
            date: date(2026, 1, 1),
            timestamp: ts(2026, 1, 1),
            bucket,
            side,
            ticker: ticker.to_string(),
            shares,
            price,
            amount: shares * price,
            cumulative_shares_after: cum,
            note: String::new(),
        }
    }

    #[test]
    fn pnl_round_trip_matches_spec_example_3() {
        // BUY 100 AAPL @150, SELL 50 AAPL @160; current price 170.
        let trades = vec![
            trade(Bucket::Low, Side::Buy, "AAPL", 100.0, 150.0, 100.0),
            trade(Bucket::Low, Side::Sell, "AAPL", 50.0, 160.0, 50.0),
        ];
        let mut prices = HashMap::new();
        prices.insert("AAPL".to_string(), 170.0);

        assert_eq!(positions_value(&trades, Bucket::Low, &prices), 50.0 * 170.0);
        assert_eq!(realized_pnl(&trades, Bucket::Low), 500.0);
        assert_eq!(unrealized_pnl(&trades, Bucket::Low, &prices), 1000.0);
    }

    #[test]
    fn cash_reflects_only_completed_operations() {
        let ops = vec![
            Operation {
                date: date(2026, 1, 1),
                timestamp: ts(2026, 1, 1),
                kind: OperationKind::Deposit,
                bucket: Bucket::Low,
                amount: 1000.0,
                status: OperationStatus::Completed,
                balance_after: 1000.0,
                note: String::new(),
            },
            Operation {
                date: date(2026, 1, 2),
                timestamp: ts(2026, 1, 2),
                kind: OperationKind::Deposit,
                bucket: Bucket::Low,
                amount: 500.0,
                status: OperationStatus::Pending,
                balance_after: 0.0,
                note: String::new(),
            },
        ];
        assert_eq!(cash_with_trades(&ops, &[], Bucket::Low), 1000.0);
    }

    #[test]
    fn position_shares_defaults_to_zero_when_untraded() {
        assert_eq!(position_shares(&[], Bucket::Low, "AAPL"), 0.0);
    }
}
