//! Total portfolio value threshold evaluation.

use sentinel_entity::alert::rules::{Direction, PortfolioValueConditions};
use sentinel_entity::notification::Severity;
use sentinel_provider::PortfolioBalance;

use super::NotificationDraft;

/// Compare the portfolio's total USD value (native plus every token)
/// against the configured threshold.
pub(super) fn evaluate(
    conditions: &PortfolioValueConditions,
    portfolio: &PortfolioBalance,
) -> Option<NotificationDraft> {
    let total_value = portfolio.total_usd();
    let threshold = conditions.threshold;

    let triggered = match conditions.direction {
        Direction::Above => total_value > threshold,
        Direction::Below => total_value < threshold,
    };
    if !triggered {
        return None;
    }

    Some(NotificationDraft {
        title: "Portfolio Value Alert".to_string(),
        message: format!(
            "Your portfolio is now ${:.2} ({} ${})",
            total_value, conditions.direction, threshold
        ),
        severity: Severity::Info,
        metadata: serde_json::json!({
            "currentValue": total_value,
            "threshold": threshold,
            "direction": conditions.direction,
        }),
    })
}
