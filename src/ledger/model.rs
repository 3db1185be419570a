// =============================================================================
// Ledger data model — §3, persisted as CSV per §4.8A
// =============================================================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::{Bucket, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestorStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investor {
    pub name: String,
    pub creation_date: NaiveDate,
    pub fee_percent: f64,
    pub is_fee_receiver: bool,
    pub high_watermark: f64,
    pub last_fee_date: Option<NaiveDate>,
    pub status: InvestorStatus,
}

impl Investor {
    pub fn is_active(&self) -> bool {
        matches!(self.status, InvestorStatus::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Deposit,
    Withdraw,
    Fee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Pending,
    Completed,
}

/// One row of an investor's `operations.csv`. `note` is free text; the
/// opaque id returned by `deposit`/`withdraw` is embedded there as
/// `id:<uuid>` rather than given its own column, since §3 does not list an
/// id column and the note field is otherwise unused at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub date: NaiveDate,
    pub timestamp: NaiveDateTime,
    pub kind: OperationKind,
    pub bucket: Bucket,
    pub amount: f64,
    pub status: OperationStatus,
    pub balance_after: f64,
    pub note: String,
}

impl Operation {
    pub fn id(&self) -> Option<&str> {
        self.note.strip_prefix("id:").map(|rest| {
            rest.split(' ').next().unwrap_or(rest)
        })
    }
}

/// One row of an investor's `trades.csv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub timestamp: NaiveDateTime,
    pub bucket: Bucket,
    pub side: Side,
    pub ticker: String,
    pub shares: f64,
    pub price: f64,
    pub amount: f64,
    pub cumulative_shares_after: f64,
    pub note: String,
}

/// One row of an investor's `balances_snapshot.csv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSnapshotRow {
    pub date: NaiveDate,
    pub bucket: Bucket,
    pub cash: f64,
    pub positions_value: f64,
    pub unrealized_pnl: f64,
    pub realized_pnl: f64,
    pub total_value: f64,
}
