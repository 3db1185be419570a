// =============================================================================
// Aurora Rebalancer — Main Entry Point
// =============================================================================
//
// Wires the runtime config into a fleet of single-account strategies plus an
// optional live multi-bucket strategy, then spawns the scheduler's job loops
// and waits for a shutdown signal.
// =============================================================================

mod broker;
mod clock;
mod config;
mod error;
mod execution;
mod ledger;
mod live_strategy;
mod market_data;
mod notifier;
mod rebalance_flag;
mod retry;
mod selector;
mod strategy;
mod supervisor;
mod tradability;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use broker::AlpacaClient;
use config::RuntimeConfig;
use ledger::Ledger;
use live_strategy::LiveStrategy;
use market_data::{AlpacaDataProvider, MarketDataLoader};
use notifier::TelegramNotifier;
use rebalance_flag::RebalanceFlagStore;
use strategy::Strategy;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("aurora-rebalancer starting up");

    let config_path = std::env::var("AURORA_CONFIG_PATH").unwrap_or_else(|_| "runtime_config.json".to_string());
    let config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load runtime config, using defaults");
        RuntimeConfig::default()
    });

    if let Err(e) = config.validate() {
        error!(error = %e, "startup aborted: invalid configuration");
        return Err(e.into());
    }

    // ── Market-data provider + loader (shared across all strategies) ───────
    let data_api_key = std::env::var("ALPACA_DATA_API_KEY").unwrap_or_default();
    let data_api_secret = std::env::var("ALPACA_DATA_API_SECRET").unwrap_or_default();
    let data_provider = Arc::new(AlpacaDataProvider::new(
        "https://data.alpaca.markets",
        &data_api_key,
        &data_api_secret,
    ));
    let loader = Arc::new(MarketDataLoader::new(data_provider, config.market_data.clone()));

    // ── Single-account strategy fleet ───────────────────────────────────────
    let mut strategies = Vec::new();
    let mut first_broker: Option<Arc<dyn broker::BrokerClient>> = None;

    for entry in &config.strategies {
        if !entry.enabled {
            continue;
        }

        let api_key = std::env::var(&entry.api_key_env).unwrap_or_default();
        let api_secret = std::env::var(&entry.api_secret_env).unwrap_or_default();
        if api_key.is_empty() || api_secret.is_empty() {
            warn!(strategy = %entry.name, "missing credentials, skipping strategy");
            continue;
        }

        let client: Arc<dyn broker::BrokerClient> =
            Arc::new(AlpacaClient::new(entry.base_url.as_str(), &api_key, &api_secret));
        if first_broker.is_none() {
            first_broker = Some(client.clone());
        }

        let universe = market_data::universe::by_name(&entry.universe).unwrap_or_else(|| {
            warn!(strategy = %entry.name, universe = %entry.universe, "unknown universe, defaulting to low");
            market_data::universe::low_universe()
        });

        strategies.push(Strategy::new(entry.name.clone(), client, universe, entry.top_n));
    }

    info!(count = strategies.len(), "single-account strategies configured");

    // ── Ledger + live multi-bucket strategy (optional) ──────────────────────
    let ledger = Ledger::load(&config.ledger_root, &config.registry_path)
        .map(Arc::new)
        .ok();

    let live_strategy = match (&config.live_strategy, &ledger) {
        (Some(live_cfg), Some(ledger)) if live_cfg.enabled => {
            let api_key = std::env::var(&live_cfg.api_key_env).unwrap_or_default();
            let api_secret = std::env::var(&live_cfg.api_secret_env).unwrap_or_default();
            if api_key.is_empty() || api_secret.is_empty() {
                warn!("missing live-strategy credentials, live multi-bucket strategy disabled");
                None
            } else {
                let client: Arc<dyn broker::BrokerClient> =
                    Arc::new(AlpacaClient::new(live_cfg.base_url.as_str(), &api_key, &api_secret));
                if first_broker.is_none() {
                    first_broker = Some(client.clone());
                }
                Some(LiveStrategy::new(client, ledger.clone(), live_cfg.top_n))
            }
        }
        _ => None,
    };

    // ── Notifier ─────────────────────────────────────────────────────────────
    let bot_token = config
        .notifier
        .bot_token_env
        .as_ref()
        .and_then(|env_var| std::env::var(env_var).ok());
    let notifier: Arc<dyn notifier::Notifier> = Arc::new(TelegramNotifier::new(
        bot_token,
        config.notifier.admin_chat_ids.clone(),
        config.notifier.confirmation_timeout_secs,
    ));

    let flag_store = RebalanceFlagStore::new(&config.rebalance_flag_path);

    let supervisor = supervisor::Supervisor::new(
        strategies,
        live_strategy,
        ledger,
        notifier,
        flag_store,
        loader,
        first_broker,
        &config,
    );

    let handles = supervisor::spawn_jobs(supervisor.clone());

    info!("all scheduler jobs running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    warn!("shutdown signal received, draining in-flight jobs");

    supervisor.request_shutdown();
    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "scheduler job exited with a join error during shutdown");
        }
    }

    info!("aurora-rebalancer shut down complete");
    Ok(())
}
