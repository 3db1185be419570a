// =============================================================================
// Momentum Selector (C4)
// =============================================================================

use crate::market_data::BarHistory;

/// Rank `universe` by trailing total return over the retained bar window and
/// return the top `n` tickers (fewer if fewer are eligible).
///
/// A ticker is eligible only if both its first and last close in `history`
/// are present. Ties in return are broken by ticker name ascending, so the
/// result is fully deterministic given identical inputs.
pub fn select(history: &BarHistory, universe: &[String], n: usize) -> Vec<String> {
    let mut ranked: Vec<(String, f64)> = universe
        .iter()
        .filter_map(|ticker| {
            let (first, last) = history.first_last_close(ticker)?;
            if first == 0.0 {
                return None;
            }
            Some((ticker.clone(), last / first - 1.0))
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    ranked.into_iter().take(n).map(|(ticker, _)| ticker).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history_with(tickers: &[(&str, f64, f64)]) -> BarHistory {
        let mut h = BarHistory::new();
        for (ticker, first, last) in tickers {
            h.insert_close(ticker, date(2026, 1, 1), *first);
            h.insert_close(ticker, date(2026, 6, 1), *last);
        }
        h
    }

    #[test]
    fn ranks_by_total_return_descending() {
        let history = history_with(&[("A", 100.0, 150.0), ("B", 100.0, 200.0), ("C", 100.0, 110.0)]);
        let universe = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(select(&history, &universe, 3), vec!["B", "A", "C"]);
    }

    #[test]
    fn truncates_to_top_n() {
        let history = history_with(&[("A", 100.0, 150.0), ("B", 100.0, 200.0), ("C", 100.0, 110.0)]);
        let universe = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(select(&history, &universe, 2), vec!["B", "A"]);
    }

    #[test]
    fn drops_tickers_with_absent_first_or_last_close() {
        let mut history = history_with(&[("A", 100.0, 150.0)]);
        history.insert_close("B", date(2026, 6, 1), 200.0); // no first close
        let universe = vec!["A".to_string(), "B".to_string()];
        assert_eq!(select(&history, &universe, 5), vec!["A".to_string()]);
    }

    #[test]
    fn ties_break_by_ticker_name_ascending() {
        let history = history_with(&[("Z", 100.0, 150.0), ("A", 100.0, 150.0)]);
        let universe = vec!["Z".to_string(), "A".to_string()];
        assert_eq!(select(&history, &universe, 2), vec!["A", "Z"]);
    }

    #[test]
    fn fewer_than_n_eligible_returns_all_eligible() {
        let history = history_with(&[("A", 100.0, 150.0)]);
        let universe = vec!["A".to_string(), "B".to_string()];
        assert_eq!(select(&history, &universe, 10), vec!["A".to_string()]);
    }
}
