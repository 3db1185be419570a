// =============================================================================
// Rebalance-Flag Store (C2) — persistent "last rebalance date" record
// =============================================================================
//
// A single-value record: the NY-calendar date of the last successful
// rebalance. Persistence follows the same atomic tmp + rename discipline as
// the runtime config, so a crash mid-write cannot leave a half-written date
// behind.
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::error;

pub struct RebalanceFlagStore {
    path: PathBuf,
}

impl RebalanceFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The stored NY-calendar date, or `None` if absent or malformed.
    /// A malformed stored value is a recoverable error: it is logged and
    /// treated as absent rather than propagated.
    pub fn last_date(&self) -> Option<NaiveDate> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to read rebalance flag");
                return None;
            }
        };

        let trimmed = content.trim();
        match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    raw = trimmed,
                    error = %e,
                    "malformed rebalance flag contents — treating as absent"
                );
                None
            }
        }
    }

    /// True iff the stored date equals `today`.
    pub fn rebalanced_on(&self, today: NaiveDate) -> bool {
        self.last_date() == Some(today)
    }

    /// Atomically replace the record with `today`. Creates parent
    /// directories as needed.
    pub fn write(&self, today: NaiveDate) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
        }

        let tmp_path = tmp_sibling(&self.path);
        std::fs::write(&tmp_path, today.format("%Y-%m-%d").to_string())
            .with_context(|| format!("failed to write tmp rebalance flag to {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("failed to rename tmp rebalance flag to {}", self.path.display()))?;

        Ok(())
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "rebalance_flag".to_string());
    name.push_str(".tmp");
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
        _ => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn absent_file_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = RebalanceFlagStore::new(dir.path().join("flag.txt"));
        assert_eq!(store.last_date(), None);
        assert!(!store.rebalanced_on(date(2026, 7, 27)));
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = RebalanceFlagStore::new(dir.path().join("nested").join("flag.txt"));
        store.write(date(2026, 7, 27)).unwrap();
        assert_eq!(store.last_date(), Some(date(2026, 7, 27)));
        assert!(store.rebalanced_on(date(2026, 7, 27)));
        assert!(!store.rebalanced_on(date(2026, 7, 28)));
    }

    #[test]
    fn write_is_idempotent_within_one_day() {
        let dir = TempDir::new().unwrap();
        let store = RebalanceFlagStore::new(dir.path().join("flag.txt"));
        store.write(date(2026, 7, 27)).unwrap();
        store.write(date(2026, 7, 27)).unwrap();
        assert_eq!(store.last_date(), Some(date(2026, 7, 27)));
    }

    #[test]
    fn malformed_contents_treated_as_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flag.txt");
        std::fs::write(&path, "not-a-date").unwrap();
        let store = RebalanceFlagStore::new(path);
        assert_eq!(store.last_date(), None);
    }
}
