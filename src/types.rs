// =============================================================================
// Shared scalar types
// =============================================================================

use serde::{Deserialize, Serialize};

/// One of the three virtual sub-accounts driven by the live multi-bucket
/// strategy. Order matters: buckets are always processed low, medium, high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Low,
    Medium,
    High,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Low, Bucket::Medium, Bucket::High];

    /// Default allocation weight for a default-split deposit/withdraw.
    pub fn default_weight(self) -> f64 {
        match self {
            Bucket::Low => 0.45,
            Bucket::Medium => 0.35,
            Bucket::High => 0.20,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Low => "low",
            Bucket::Medium => "medium",
            Bucket::High => "high",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Bucket::Low),
            "medium" => Ok(Bucket::Medium),
            "high" => Ok(Bucket::High),
            other => Err(format!("unknown bucket: {other}")),
        }
    }
}

/// Deployment environment. `Local` requires a confirmation round-trip through
/// the notifier before executing a rebalance; `Prod` executes immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Prod,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Local => write!(f, "local"),
            Environment::Prod => write!(f, "prod"),
        }
    }
}

/// Whether a strategy instance trades against a paper or live brokerage
/// endpoint. Distinct from [`Environment`], which governs confirmation
/// gating rather than which account is traded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountMode {
    #[default]
    Paper,
    Live,
}

impl std::fmt::Display for AccountMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountMode::Paper => write!(f, "paper"),
            AccountMode::Live => write!(f, "live"),
        }
    }
}

/// Side of a trade-lot entry or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_default_weights_sum_to_one() {
        let sum: f64 = Bucket::ALL.iter().map(|b| b.default_weight()).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bucket_round_trips_through_str() {
        for b in Bucket::ALL {
            let parsed: Bucket = b.as_str().parse().unwrap();
            assert_eq!(parsed, b);
        }
    }

    #[test]
    fn bucket_rejects_unknown() {
        assert!("crypto".parse::<Bucket>().is_err());
    }

    #[test]
    fn side_round_trips_through_str() {
        assert_eq!("BUY".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!("sell".parse::<Side>().unwrap(), Side::Sell);
        assert!("HOLD".parse::<Side>().is_err());
    }
}
