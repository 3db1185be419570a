pub mod loader;
pub mod provider;
pub mod universe;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use loader::MarketDataLoader;
pub use provider::AlpacaDataProvider;

/// Dense bar history, keyed `field -> ticker -> date -> price`.
///
/// Only `"Close"` is ever populated today — the source format carried two
/// competing column orientations for a wider OHLCV history; this system only
/// ever consumes adjusted close, so the other fields are omitted rather than
/// stored empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BarHistory {
    fields: BTreeMap<String, BTreeMap<String, BTreeMap<NaiveDate, f64>>>,
}

impl BarHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or overwrite) a single close price for `ticker` on `date`.
    pub fn insert_close(&mut self, ticker: &str, date: NaiveDate, price: f64) {
        self.fields
            .entry("Close".to_string())
            .or_default()
            .entry(ticker.to_string())
            .or_default()
            .insert(date, price);
    }

    /// The full close series for one ticker, ordered by date ascending.
    pub fn close_series(&self, ticker: &str) -> Option<&BTreeMap<NaiveDate, f64>> {
        self.fields.get("Close").and_then(|t| t.get(ticker))
    }

    /// First and last close for `ticker`, in date order. `None` if the
    /// ticker is absent or has no close values.
    pub fn first_last_close(&self, ticker: &str) -> Option<(f64, f64)> {
        let series = self.close_series(ticker)?;
        let first = series.values().next().copied()?;
        let last = series.values().next_back().copied()?;
        Some((first, last))
    }

    /// Latest available close for `ticker`, if any.
    pub fn last_close(&self, ticker: &str) -> Option<f64> {
        self.close_series(ticker)
            .and_then(|s| s.values().next_back().copied())
    }

    /// All tickers with at least one close value.
    pub fn tickers(&self) -> Vec<String> {
        self.fields
            .get("Close")
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn ticker_count(&self) -> usize {
        self.fields.get("Close").map(|t| t.len()).unwrap_or(0)
    }

    /// Merge another history's columns into this one. Columns already
    /// present in `self` are left untouched — used by the residual-retry
    /// loader to fold in a second attempt's partial results.
    pub fn merge(&mut self, other: BarHistory) {
        for (field, tickers) in other.fields {
            let entry = self.fields.entry(field).or_default();
            for (ticker, series) in tickers {
                entry.entry(ticker).or_insert(series);
            }
        }
    }
}

/// Market-data provider contract: a bulk daily-bar download for a set of
/// tickers over a trailing window.
///
/// Mirrors the source's `download(tickers, period, auto_adjust=true,
/// group_by=ticker)` call: missing tickers are simply absent columns in the
/// returned history, never an error by themselves.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn download(&self, tickers: &[String], period_days: u32) -> anyhow::Result<BarHistory>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_last_close_reflects_date_order_not_insertion_order() {
        let mut h = BarHistory::new();
        h.insert_close("AAPL", date(2026, 1, 10), 200.0);
        h.insert_close("AAPL", date(2026, 1, 2), 190.0);
        h.insert_close("AAPL", date(2026, 1, 20), 210.0);
        assert_eq!(h.first_last_close("AAPL"), Some((190.0, 210.0)));
    }

    #[test]
    fn absent_ticker_returns_none() {
        let h = BarHistory::new();
        assert_eq!(h.first_last_close("AAPL"), None);
        assert_eq!(h.last_close("AAPL"), None);
    }

    #[test]
    fn merge_fills_missing_columns_without_overwriting_existing() {
        let mut a = BarHistory::new();
        a.insert_close("AAPL", date(2026, 1, 2), 190.0);

        let mut b = BarHistory::new();
        b.insert_close("AAPL", date(2026, 1, 2), 999.0); // should not overwrite
        b.insert_close("MSFT", date(2026, 1, 2), 300.0);

        a.merge(b);
        assert_eq!(a.last_close("AAPL"), Some(190.0));
        assert_eq!(a.last_close("MSFT"), Some(300.0));
        assert_eq!(a.ticker_count(), 2);
    }

    #[test]
    fn tickers_lists_only_columns_with_close_data() {
        let mut h = BarHistory::new();
        h.insert_close("AAPL", date(2026, 1, 2), 190.0);
        h.insert_close("MSFT", date(2026, 1, 2), 300.0);
        let mut ts = h.tickers();
        ts.sort();
        assert_eq!(ts, vec!["AAPL".to_string(), "MSFT".to_string()]);
    }
}
