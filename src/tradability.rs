// =============================================================================
// Tradability Filter (C5)
// =============================================================================

use std::collections::HashMap;

use tracing::warn;

use crate::broker::BrokerClient;

/// Query the broker's asset endpoint per ticker; keep those with
/// status=active and tradable=true. Lookup failures are logged and the
/// ticker is retained pessimistically with `fractionable=false`, matching
/// the spec's "treated as fractionable unknown" fallback.
pub async fn filter_tradable(
    broker: &dyn BrokerClient,
    tickers: &[String],
) -> (Vec<String>, HashMap<String, bool>) {
    let mut tradable = Vec::new();
    let mut fractionable = HashMap::new();

    for ticker in tickers {
        match broker.get_asset(ticker).await {
            Ok(asset) if asset.active && asset.tradable => {
                tradable.push(ticker.clone());
                fractionable.insert(ticker.clone(), asset.fractionable);
            }
            Ok(_) => {
                // Inactive or non-tradable — silently dropped, not an error.
            }
            Err(e) => {
                warn!(ticker, error = %e, "asset lookup failed, retaining pessimistically");
                tradable.push(ticker.clone());
                fractionable.insert(ticker.clone(), false);
            }
        }
    }

    (tradable, fractionable)
}
