//! In-memory store and provider doubles shared by the monitor's tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use sentinel_core::error::AppError;
use sentinel_core::result::AppResult;
use sentinel_entity::alert::rules::Direction;
use sentinel_entity::alert::Alert;
use sentinel_entity::notification::Notification;
use sentinel_entity::wallet::Wallet;
use sentinel_provider::{PortfolioBalance, PortfolioSource, TokenBalance};

use crate::evaluator::NotificationDraft;
use crate::store::AlertStore;

/// Build an active price-change alert for a fresh user.
pub fn price_alert(token: &str, threshold: f64, direction: Direction) -> Alert {
    alert_with_rules(
        "price_change",
        serde_json::json!({
            "type": "price_change",
            "conditions": { "token": token, "threshold": threshold, "direction": direction }
        }),
    )
}

/// Build an active portfolio-value alert for a fresh user.
pub fn portfolio_alert(threshold: f64, direction: Direction) -> Alert {
    alert_with_rules(
        "portfolio_value",
        serde_json::json!({
            "type": "portfolio_value",
            "conditions": { "threshold": threshold, "direction": direction }
        }),
    )
}

/// Build an active alert with arbitrary rules JSON.
pub fn alert_with_rules(alert_type: &str, rules: serde_json::Value) -> Alert {
    Alert {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        name: format!("{alert_type} alert"),
        alert_type: alert_type.to_string(),
        rules,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Build a portfolio holding a single priced token.
pub fn portfolio_with(symbol: &str, usd: f64) -> PortfolioBalance {
    PortfolioBalance {
        native: None,
        tokens: vec![TokenBalance {
            symbol: symbol.to_string(),
            usd: Some(usd),
            ..Default::default()
        }],
    }
}

/// In-memory [`AlertStore`] double.
#[derive(Default)]
pub struct MockStore {
    alerts: Vec<Alert>,
    wallets: Mutex<HashMap<Uuid, Wallet>>,
    notifications: Mutex<Vec<(Uuid, DateTime<Utc>)>>,
    inserted: Mutex<Vec<Notification>>,
    fail_inserts: bool,
    list_delay: Option<Duration>,
    list_calls: AtomicUsize,
}

impl MockStore {
    /// Store returning the given alerts from `list_active_alerts`.
    pub fn new(alerts: Vec<Alert>) -> Self {
        Self {
            alerts,
            ..Default::default()
        }
    }

    /// Give a user an active wallet at `address`.
    pub fn with_wallet(self, user_id: Uuid, address: &str) -> Self {
        self.wallets.lock().unwrap().insert(
            user_id,
            Wallet {
                id: Uuid::new_v4(),
                user_id,
                address: address.to_string(),
                chain: "ethereum".to_string(),
                is_active: true,
                created_at: Utc::now(),
            },
        );
        self
    }

    /// Make every insert fail with a database error.
    pub fn failing_inserts(mut self) -> Self {
        self.fail_inserts = true;
        self
    }

    /// Delay `list_active_alerts` to keep a cycle in flight.
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    /// Record a pre-existing notification for the dedup probe.
    pub fn seed_notification(&self, alert_id: Uuid, created_at: DateTime<Utc>) {
        self.notifications.lock().unwrap().push((alert_id, created_at));
    }

    /// How many notifications were inserted through the store.
    pub fn inserted_count(&self) -> usize {
        self.inserted.lock().unwrap().len()
    }

    /// Snapshot of inserted notifications.
    pub fn inserted(&self) -> Vec<Notification> {
        self.inserted.lock().unwrap().clone()
    }

    /// How many times `list_active_alerts` ran.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertStore for MockStore {
    async fn list_active_alerts(&self) -> AppResult<Vec<Alert>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.alerts.clone())
    }

    async fn find_active_wallet(&self, user_id: Uuid) -> AppResult<Option<Wallet>> {
        Ok(self.wallets.lock().unwrap().get(&user_id).cloned())
    }

    async fn recent_notification_exists(
        &self,
        alert_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .any(|(id, at)| *id == alert_id && *at >= cutoff))
    }

    async fn insert_notification(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        draft: &NotificationDraft,
    ) -> AppResult<Notification> {
        if self.fail_inserts {
            return Err(AppError::database("insert failed (mock)"));
        }

        let now = Utc::now();
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            alert_id,
            title: draft.title.clone(),
            message: draft.message.clone(),
            severity: draft.severity.as_str().to_string(),
            metadata: draft.metadata.clone(),
            is_read: false,
            created_at: now,
        };

        self.notifications.lock().unwrap().push((alert_id, now));
        self.inserted.lock().unwrap().push(notification.clone());
        Ok(notification)
    }
}

/// In-memory [`PortfolioSource`] double; addresses without a canned
/// balance fail the way a provider outage would.
#[derive(Default)]
pub struct MockProvider {
    balances: HashMap<String, PortfolioBalance>,
}

impl MockProvider {
    /// Provider with no known addresses (every fetch fails).
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `balance` for `address`.
    pub fn with_balance(mut self, address: &str, balance: PortfolioBalance) -> Self {
        self.balances.insert(address.to_string(), balance);
        self
    }
}

#[async_trait]
impl PortfolioSource for MockProvider {
    async fn portfolio_balance(&self, address: &str) -> AppResult<PortfolioBalance> {
        self.balances
            .get(address)
            .cloned()
            .ok_or_else(|| AppError::external_service(format!("no balance for {address} (mock)")))
    }
}
