// =============================================================================
// Notification Port (C11)
// =============================================================================
//
// Push-only outbound interface. Delivery is best-effort — a failure here
// never aborts a rebalance. `TelegramNotifier` posts to the Telegram Bot API
// using the same `reqwest` client idiom as the brokerage client; it carries
// no dedicated bot-framework crate since a single JSON POST is all the
// surface this port needs.
// =============================================================================

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, warn};

use crate::types::Bucket;

/// One basket preview line, shown to the admin before a confirmed rebalance
/// and echoed back in `send_rebalance_preview`.
#[derive(Debug, Clone)]
pub struct BasketPreview {
    pub bucket: Option<Bucket>,
    pub strategy_name: String,
    pub to_close: Vec<String>,
    pub to_open: Vec<String>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_startup(&self, summary: &str);
    async fn send_countdown(&self, days: u32, next_date: chrono::NaiveDate);
    async fn send_rebalance_preview(&self, previews: &[BasketPreview]);
    /// `is_warning` distinguishes a non-fatal condition (logged at WARN) from
    /// a fatal one (logged at ERROR); both are delivered the same way.
    async fn send_error(&self, title: &str, detail: &str, is_warning: bool);
    /// Sends a confirmation request and returns whether an admin approved it.
    /// `None` means no answer arrived before the configured timeout.
    async fn send_confirmation_request(&self, previews: &[BasketPreview]) -> Option<bool>;
}

/// Telegram-backed notifier. Constructed with `None` (no bot token
/// configured) acts as a no-op sink — delivery is "disabled", not an error.
pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: Option<String>,
    admin_chat_ids: Vec<String>,
    confirmation_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(bot_token: Option<String>, admin_chat_ids: Vec<String>, confirmation_timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token,
            admin_chat_ids,
            confirmation_timeout: Duration::from_secs(confirmation_timeout_secs),
        }
    }

    async fn send_text(&self, text: &str) {
        let Some(token) = &self.bot_token else {
            warn!("notifier: no bot token configured, message suppressed: {text}");
            return;
        };

        for chat_id in &self.admin_chat_ids {
            let url = format!("https://api.telegram.org/bot{token}/sendMessage");
            let mut body = HashMap::new();
            body.insert("chat_id", chat_id.as_str());
            body.insert("text", text);

            let result = self
                .client
                .post(&url)
                .json(&body)
                .timeout(Duration::from_secs(10))
                .send()
                .await;

            match result {
                Ok(resp) => match resp.json::<TelegramResponse>().await {
                    Ok(parsed) if !parsed.ok => {
                        warn!(chat_id, description = ?parsed.description, "telegram rejected message");
                    }
                    Ok(_) => {}
                    Err(e) => warn!(chat_id, error = %e, "failed to parse telegram response"),
                },
                Err(e) => warn!(chat_id, error = %e, "failed to deliver telegram message"),
            }
        }
    }

    fn format_previews(previews: &[BasketPreview]) -> String {
        let mut out = String::new();
        for p in previews {
            let label = p
                .bucket
                .map(|b| b.to_string())
                .unwrap_or_else(|| p.strategy_name.clone());
            out.push_str(&format!(
                "[{label}] close: {:?}, open: {:?}\n",
                p.to_close, p.to_open
            ));
        }
        out
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_startup(&self, summary: &str) {
        self.send_text(&format!("startup: {summary}")).await;
    }

    async fn send_countdown(&self, days: u32, next_date: chrono::NaiveDate) {
        self.send_text(&format!("{days} day(s) until next rebalance ({next_date})")).await;
    }

    async fn send_rebalance_preview(&self, previews: &[BasketPreview]) {
        self.send_text(&format!("rebalance preview:\n{}", Self::format_previews(previews))).await;
    }

    async fn send_error(&self, title: &str, detail: &str, is_warning: bool) {
        let level = if is_warning { "WARNING" } else { "ERROR" };
        // Best-effort only: any failure inside send_text is already swallowed
        // there (logged, not propagated), so this call can never re-enter the
        // logging -> notification path.
        self.send_text(&format!("[{level}] {title}: {detail}")).await;
        if is_warning {
            warn!(title, detail, "notifier: warning dispatched");
        } else {
            error!(title, detail, "notifier: error dispatched");
        }
    }

    async fn send_confirmation_request(&self, previews: &[BasketPreview]) -> Option<bool> {
        self.send_text(&format!(
            "confirmation requested:\n{}\nreply not supported by this transport; awaiting external signal",
            Self::format_previews(previews)
        ))
        .await;

        // This notifier's delivery transport has no inbound channel wired up
        // (the admin replies via a separate long-poll listener owned by the
        // supervisor); this call always reports "no answer yet" and leaves
        // the actual wait/timeout to the confirmation channel the supervisor
        // polls directly.
        tokio::time::sleep(Duration::from_millis(0)).await;
        let _ = self.confirmation_timeout;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_with_no_bot_token_is_a_silent_no_op() {
        let notifier = TelegramNotifier::new(None, vec!["123".to_string()], 30);
        notifier.send_startup("engine up").await;
        notifier.send_error("boom", "detail", true).await;
    }

    #[test]
    fn format_previews_includes_bucket_labels() {
        let previews = vec![BasketPreview {
            bucket: Some(Bucket::Low),
            strategy_name: "low".to_string(),
            to_close: vec!["AAPL".to_string()],
            to_open: vec!["MSFT".to_string()],
        }];
        let formatted = TelegramNotifier::format_previews(&previews);
        assert!(formatted.contains("[low]"));
        assert!(formatted.contains("AAPL"));
        assert!(formatted.contains("MSFT"));
    }
}
