//! Condition evaluators.
//!
//! Pure verdict functions: one alert's parsed rules plus freshly fetched
//! portfolio data in, an optional notification draft out. No I/O happens
//! here — the scheduler owns wallet resolution and provider fetches.

mod liquidation;
mod portfolio;
mod price;

use tracing::warn;
use uuid::Uuid;

use sentinel_entity::alert::{Alert, AlertRules};
use sentinel_entity::notification::Severity;
use sentinel_provider::PortfolioBalance;

/// What the recorder persists for a triggered alert.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    /// Notification title.
    pub title: String,
    /// Human-readable body, including the observed value and threshold.
    pub message: String,
    /// Severity level.
    pub severity: Severity,
    /// Structured context (token, prices, deviation, …).
    pub metadata: serde_json::Value,
}

/// Parse an alert's stored rules, logging and returning `None` when they
/// are missing, malformed, or of an unrecognized type. Invalid rules are
/// a per-alert condition, never a cycle error.
pub fn parse_rules(alert: &Alert) -> Option<AlertRules> {
    match alert.parsed_rules() {
        Ok(rules) => Some(rules),
        Err(e) => {
            warn!(alert_id = %alert.id, error = %e, "Alert has invalid rules");
            None
        }
    }
}

/// Evaluate parsed rules against portfolio data.
///
/// Returns a draft when the alert triggered. Unsupported rule types log
/// and return `None` so the cycle loop stays uniform across alert types.
pub fn evaluate(
    alert_id: Uuid,
    rules: &AlertRules,
    portfolio: &PortfolioBalance,
) -> Option<NotificationDraft> {
    match rules {
        AlertRules::PriceChange(conditions) => price::evaluate(alert_id, conditions, portfolio),
        AlertRules::PortfolioValue(conditions) => {
            portfolio::evaluate(conditions, portfolio)
        }
        AlertRules::LiquidationRisk(_) => liquidation::evaluate(alert_id),
        AlertRules::Custom(_) => {
            warn!(alert_id = %alert_id, "Custom alert rules are not evaluated automatically");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sentinel_entity::alert::rules::{Direction, PriceChangeConditions};
    use sentinel_provider::TokenBalance;

    fn portfolio_with(symbol: &str, usd: Option<f64>) -> PortfolioBalance {
        PortfolioBalance {
            native: None,
            tokens: vec![TokenBalance {
                symbol: symbol.to_string(),
                usd,
                ..Default::default()
            }],
        }
    }

    fn price_rules(token: &str, threshold: f64, direction: Direction) -> AlertRules {
        AlertRules::PriceChange(PriceChangeConditions {
            token: token.to_string(),
            chain: None,
            threshold,
            direction,
            percentage: None,
        })
    }

    fn alert_with_rules(rules: serde_json::Value) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "test".to_string(),
            alert_type: "price_change".to_string(),
            rules,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_price_above_triggers_with_warning() {
        let rules = price_rules("ETH", 3000.0, Direction::Above);
        let portfolio = portfolio_with("ETH", Some(3100.0));

        let draft = evaluate(Uuid::new_v4(), &rules, &portfolio).expect("should trigger");
        assert_eq!(draft.severity, Severity::Warning);
        assert!(draft.message.contains("3100"));
        assert!(draft.message.contains("above $3000"));
        assert_eq!(draft.metadata["changePercent"], "3.33");
    }

    #[test]
    fn test_price_above_does_not_trigger_below_threshold() {
        let rules = price_rules("ETH", 3000.0, Direction::Above);
        let portfolio = portfolio_with("ETH", Some(2900.0));
        assert!(evaluate(Uuid::new_v4(), &rules, &portfolio).is_none());
    }

    #[test]
    fn test_price_below_triggers_when_under_threshold() {
        let rules = price_rules("ETH", 3000.0, Direction::Below);
        let portfolio = portfolio_with("ETH", Some(2500.0));

        let draft = evaluate(Uuid::new_v4(), &rules, &portfolio).expect("should trigger");
        assert!(draft.message.contains("below $3000"));
        // (3000 - 2500) / 3000 * 100
        assert_eq!(draft.metadata["changePercent"], "16.67");
    }

    #[test]
    fn test_price_symbol_match_is_case_insensitive() {
        let rules = price_rules("eth", 3000.0, Direction::Above);
        let portfolio = portfolio_with("ETH", Some(3100.0));
        assert!(evaluate(Uuid::new_v4(), &rules, &portfolio).is_some());
    }

    #[test]
    fn test_price_skips_missing_token() {
        let rules = price_rules("BTC", 50_000.0, Direction::Above);
        let portfolio = portfolio_with("ETH", Some(3100.0));
        assert!(evaluate(Uuid::new_v4(), &rules, &portfolio).is_none());
    }

    #[test]
    fn test_price_skips_token_without_usd_value() {
        let rules = price_rules("ETH", 3000.0, Direction::Above);
        let portfolio = portfolio_with("ETH", None);
        assert!(evaluate(Uuid::new_v4(), &rules, &portfolio).is_none());
    }

    #[test]
    fn test_portfolio_value_below_triggers_with_info() {
        let rules: AlertRules = serde_json::from_value(serde_json::json!({
            "type": "portfolio_value",
            "conditions": { "threshold": 10000.0, "direction": "below" }
        }))
        .unwrap();
        let portfolio = PortfolioBalance {
            native: Some("5000".to_string()),
            tokens: vec![TokenBalance {
                symbol: "ETH".to_string(),
                usd: Some(3000.0),
                ..Default::default()
            }],
        };

        let draft = evaluate(Uuid::new_v4(), &rules, &portfolio).expect("should trigger");
        assert_eq!(draft.severity, Severity::Info);
        assert!(draft.message.contains("8000"));
        assert!(draft.message.contains("below $10000"));
    }

    #[test]
    fn test_liquidation_risk_never_triggers() {
        let rules: AlertRules = serde_json::from_value(serde_json::json!({
            "type": "liquidation_risk",
            "conditions": { "protocol": "aave" }
        }))
        .unwrap();
        assert!(evaluate(Uuid::new_v4(), &rules, &PortfolioBalance::default()).is_none());
    }

    #[test]
    fn test_custom_rules_never_trigger() {
        let rules: AlertRules = serde_json::from_value(serde_json::json!({
            "type": "custom",
            "conditions": { "anything": true }
        }))
        .unwrap();
        assert!(evaluate(Uuid::new_v4(), &rules, &PortfolioBalance::default()).is_none());
    }

    #[test]
    fn test_parse_rules_handles_unknown_type() {
        let alert = alert_with_rules(serde_json::json!({
            "type": "moon_phase",
            "conditions": {}
        }));
        assert!(parse_rules(&alert).is_none());
    }

    #[test]
    fn test_parse_rules_handles_missing_type() {
        let alert = alert_with_rules(serde_json::json!({}));
        assert!(parse_rules(&alert).is_none());
    }
}
