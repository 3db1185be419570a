// =============================================================================
// Market-Data Cache & Loader (C3)
// =============================================================================
//
// A single shared universe download with per-attempt residual-retry logic
// and a time-bounded on-disk snapshot. Mirrors the teacher's retry-loop
// idiom (spawn-and-sleep), applied here to a synchronous retry-within-a-call
// rather than an outer reconnect loop.
// =============================================================================

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::MarketDataConfig;
use crate::error::CoreError;

use super::{BarHistory, DataProvider};

pub struct MarketDataLoader {
    provider: Arc<dyn DataProvider>,
    cache_path: PathBuf,
    config: MarketDataConfig,
}

impl MarketDataLoader {
    pub fn new(provider: Arc<dyn DataProvider>, config: MarketDataConfig) -> Self {
        let cache_path = PathBuf::from(&config.cache_path);
        Self {
            provider,
            cache_path,
            config,
        }
    }

    /// Returns adjusted daily closes over the configured look-back period
    /// for the full union universe, using the on-disk snapshot when fresh.
    pub async fn load(&self, universe: &[String]) -> Result<BarHistory, CoreError> {
        if let Some(history) = self.read_fresh_snapshot() {
            return Ok(history);
        }

        let history = self.download_with_retry(universe).await?;
        self.write_snapshot(&history);
        Ok(history)
    }

    fn read_fresh_snapshot(&self) -> Option<BarHistory> {
        let meta = std::fs::metadata(&self.cache_path).ok()?;
        let modified = meta.modified().ok()?;
        let age = modified.elapsed().ok()?;
        if age > Duration::from_secs(self.config.cache_ttl_hours * 3600) {
            return None;
        }

        let content = std::fs::read_to_string(&self.cache_path).ok()?;
        match serde_json::from_str(&content) {
            Ok(history) => {
                info!(path = %self.cache_path.display(), "market data snapshot hit");
                Some(history)
            }
            Err(e) => {
                warn!(error = %e, "market data snapshot corrupt, forcing refresh");
                None
            }
        }
    }

    fn write_snapshot(&self, history: &BarHistory) {
        let Ok(content) = serde_json::to_string(history) else {
            warn!("failed to serialise market data snapshot, skipping write");
            return;
        };

        if let Some(parent) = self.cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!(error = %e, "failed to create market data cache directory");
                    return;
                }
            }
        }

        let tmp_path = tmp_sibling(&self.cache_path);
        if let Err(e) = std::fs::write(&tmp_path, &content) {
            warn!(error = %e, "failed to write tmp market data snapshot");
            return;
        }
        if let Err(e) = std::fs::rename(&tmp_path, &self.cache_path) {
            warn!(error = %e, "failed to rename tmp market data snapshot into place");
        }
    }

    async fn download_with_retry(&self, universe: &[String]) -> Result<BarHistory, CoreError> {
        let mut accumulated = BarHistory::new();
        let mut residual: Vec<String> = universe.to_vec();
        let max_attempts = if self.config.enable_retry {
            self.config.max_retries.max(1)
        } else {
            1
        };

        for attempt in 1..=max_attempts {
            if residual.is_empty() {
                break;
            }

            let batch = match self
                .provider
                .download(&residual, self.config.period_days)
                .await
            {
                Ok(b) => b,
                Err(e) => {
                    warn!(attempt, error = %e, "market data download attempt failed");
                    BarHistory::new()
                }
            };

            accumulated.merge(batch);

            residual = residual
                .iter()
                .filter(|t| accumulated.last_close(t).is_none())
                .cloned()
                .collect();

            if residual.is_empty() {
                break;
            }

            if attempt < max_attempts {
                warn!(
                    attempt,
                    missing = residual.len(),
                    "retrying missing tickers after delay"
                );
                tokio::time::sleep(Duration::from_secs(self.config.retry_delay_secs)).await;
            }
        }

        if !residual.is_empty() {
            warn!(missing = ?residual, "tickers still missing after final retry attempt");
        }

        if accumulated.ticker_count() == 0 {
            return Err(CoreError::DataUnavailable(
                "no tickers returned any close data".to_string(),
            ));
        }

        Ok(accumulated)
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cache".to_string());
    name.push_str(".tmp");
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
        _ => PathBuf::from(name),
    }
}
