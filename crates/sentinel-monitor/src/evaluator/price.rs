//! Token price threshold evaluation.

use tracing::debug;
use uuid::Uuid;

use sentinel_entity::alert::rules::{Direction, PriceChangeConditions};
use sentinel_entity::notification::Severity;
use sentinel_provider::PortfolioBalance;

use super::NotificationDraft;

/// Compare the token's current USD price in the portfolio against the
/// configured threshold.
pub(super) fn evaluate(
    alert_id: Uuid,
    conditions: &PriceChangeConditions,
    portfolio: &PortfolioBalance,
) -> Option<NotificationDraft> {
    let token = match portfolio.find_token(&conditions.token) {
        Some(t) => t,
        None => {
            debug!(
                alert_id = %alert_id,
                token = %conditions.token,
                "Token not found in portfolio"
            );
            return None;
        }
    };

    let current_price = match token.usd {
        Some(usd) => usd,
        None => {
            debug!(
                alert_id = %alert_id,
                token = %conditions.token,
                "Token has no USD value"
            );
            return None;
        }
    };

    let threshold = conditions.threshold;
    let triggered = match conditions.direction {
        Direction::Above => current_price > threshold,
        Direction::Below => current_price < threshold,
    };
    if !triggered {
        return None;
    }

    // Deviation from the threshold, for display.
    let change_percent = match conditions.direction {
        Direction::Above => (current_price - threshold) / threshold * 100.0,
        Direction::Below => (threshold - current_price) / threshold * 100.0,
    };

    Some(NotificationDraft {
        title: format!("{} Price Alert Triggered", conditions.token),
        message: format!(
            "{} is now ${:.2} ({} ${})",
            conditions.token, current_price, conditions.direction, threshold
        ),
        severity: Severity::Warning,
        metadata: serde_json::json!({
            "token": &conditions.token,
            "currentPrice": current_price,
            "threshold": threshold,
            "direction": conditions.direction,
            "changePercent": format!("{change_percent:.2}"),
        }),
    })
}
