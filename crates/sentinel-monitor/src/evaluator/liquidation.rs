//! Liquidation risk evaluation.
//!
//! Declared but not yet implemented — it needs DeFi position data the
//! provider does not expose yet. Recognizing the type and returning
//! "not triggered" keeps the cycle loop uniform across alert types.

use tracing::debug;
use uuid::Uuid;

use super::NotificationDraft;

pub(super) fn evaluate(alert_id: Uuid) -> Option<NotificationDraft> {
    debug!(alert_id = %alert_id, "Liquidation risk alerts are not yet supported");
    None
}
