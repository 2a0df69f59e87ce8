//! Typed alert rules.
//!
//! Stored in the database as `{ "type": …, "conditions": … }` JSON and
//! parsed into this sum type before evaluation, so that each alert type
//! gets its own evaluator without the monitor loop caring which one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Threshold comparison direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Trigger when the observed value is greater than the threshold.
    Above,
    /// Trigger when the observed value is less than the threshold.
    Below,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Above => write!(f, "above"),
            Self::Below => write!(f, "below"),
        }
    }
}

/// Conditions for a token price alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChangeConditions {
    /// Token symbol, matched case-insensitively against the portfolio.
    pub token: String,
    /// Chain hint. Informational only for now.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    /// Price threshold in USD.
    pub threshold: f64,
    /// Comparison direction.
    pub direction: Direction,
    /// Optional percentage condition (reserved).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

/// Conditions for a total portfolio value alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValueConditions {
    /// Value threshold in USD.
    pub threshold: f64,
    /// Comparison direction.
    pub direction: Direction,
}

/// Tagged alert rules, one variant per alert type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "conditions", rename_all = "snake_case")]
pub enum AlertRules {
    /// Token price crossed a threshold.
    PriceChange(PriceChangeConditions),
    /// Total portfolio value crossed a threshold.
    PortfolioValue(PortfolioValueConditions),
    /// Liquidation risk on a lending position. Declared but not yet
    /// evaluated — requires DeFi position data from the provider.
    LiquidationRisk(serde_json::Value),
    /// Free-form user rules; never evaluated automatically.
    Custom(serde_json::Value),
}

impl AlertRules {
    /// The wire name of this rules type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::PriceChange(_) => "price_change",
            Self::PortfolioValue(_) => "portfolio_value",
            Self::LiquidationRisk(_) => "liquidation_risk",
            Self::Custom(_) => "custom",
        }
    }

    /// Whether evaluating these rules needs live portfolio data.
    pub fn requires_portfolio(&self) -> bool {
        matches!(self, Self::PriceChange(_) | Self::PortfolioValue(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portfolio_value_roundtrip() {
        let rules = AlertRules::PortfolioValue(PortfolioValueConditions {
            threshold: 10_000.0,
            direction: Direction::Below,
        });
        let json = serde_json::to_value(&rules).expect("serialize");
        assert_eq!(json["type"], "portfolio_value");
        assert_eq!(json["conditions"]["direction"], "below");

        let parsed: AlertRules = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed, rules);
    }

    #[test]
    fn test_liquidation_risk_preserves_conditions() {
        let json = serde_json::json!({
            "type": "liquidation_risk",
            "conditions": { "protocol": "aave", "health_factor": 1.1 }
        });
        let parsed: AlertRules = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed.type_name(), "liquidation_risk");
        assert!(!parsed.requires_portfolio());
    }

    #[test]
    fn test_invalid_direction_is_rejected() {
        let json = serde_json::json!({
            "type": "price_change",
            "conditions": { "token": "ETH", "threshold": 1.0, "direction": "sideways" }
        });
        assert!(serde_json::from_value::<AlertRules>(json).is_err());
    }

    #[test]
    fn test_missing_threshold_is_rejected() {
        let json = serde_json::json!({
            "type": "portfolio_value",
            "conditions": { "direction": "above" }
        });
        assert!(serde_json::from_value::<AlertRules>(json).is_err());
    }
}
