// =============================================================================
// Error taxonomy — §7
// =============================================================================
//
// A closed set of domain conditions the rest of the engine reasons about
// explicitly. Infrastructure failures (I/O, transport, (de)serialization) are
// wrapped into `anyhow::Error` at the point they cross into domain logic and
// are not given their own variant here — only the named conditions in the
// error-handling design get first-class variants so callers can match on
// them (e.g. the scheduler treats `RebalanceFailed` differently from a
// per-ticker `OrderFailed`).
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// C3 could not retrieve any usable bars at all.
    #[error("market data unavailable: {0}")]
    DataUnavailable(String),

    /// C7/C9 refuses to open positions (cash <= 0 or per-position < $1).
    #[error("insufficient funds to open positions: {0}")]
    InsufficientFunds(String),

    /// A single broker order failed. Collected per strategy, never aborts
    /// the strategy by itself.
    #[error("order failed for {ticker}: {reason}")]
    OrderFailed { ticker: String, reason: String },

    /// Composite failure raised by the scheduler when a strategy throws at
    /// the top level (as opposed to per-order failures). The rebalance flag
    /// is not written when this is returned.
    #[error("rebalance failed for {failed_count} of {total_count} strategies: {detail}")]
    RebalanceFailed {
        failed_count: usize,
        total_count: usize,
        detail: String,
    },

    /// C8 integrity check found a ledger/broker equity mismatch beyond
    /// tolerance.
    #[error("reconciliation failed: {0}")]
    ReconciliationFailed(String),

    /// Startup failure: no enabled strategies, or a required credential is
    /// missing. The process exits non-zero after logging this.
    #[error("configuration missing or invalid: {0}")]
    ConfigMissing(String),

    /// A withdrawal request exceeds the computed balance.
    #[error("insufficient balance for {investor} in {bucket}: requested {requested:.2}, available {available:.2}")]
    InsufficientBalance {
        investor: String,
        bucket: String,
        requested: f64,
        available: f64,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_include_named_fields() {
        let e = CoreError::InsufficientBalance {
            investor: "Cherry".into(),
            bucket: "low".into(),
            requested: 500.0,
            available: 100.0,
        };
        let msg = e.to_string();
        assert!(msg.contains("Cherry"));
        assert!(msg.contains("500.00"));
        assert!(msg.contains("100.00"));
    }

    #[test]
    fn rebalance_failed_carries_counts() {
        let e = CoreError::RebalanceFailed {
            failed_count: 1,
            total_count: 3,
            detail: "strategy 'low-risk' panicked".into(),
        };
        assert!(e.to_string().contains("1 of 3"));
    }
}
