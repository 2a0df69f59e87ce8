//! Application state shared across all handlers.

use std::sync::Arc;

use sentinel_core::config::AppConfig;
use sentinel_database::repositories::alert::AlertRepository;
use sentinel_database::repositories::notification::NotificationRepository;
use sentinel_database::DatabasePool;
use sentinel_monitor::AlertScheduler;
use sentinel_realtime::NotificationBus;

use crate::auth::JwtAuth;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped (or cheaply clonable) so the state clones per request.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Database pool, for health checks.
    pub db: DatabasePool,
    /// Alert repository.
    pub alerts: Arc<AlertRepository>,
    /// Notification repository.
    pub notifications: Arc<NotificationRepository>,
    /// Notification bus delivery sessions subscribe to.
    pub bus: Arc<NotificationBus>,
    /// Alert scheduler, for the manual-check endpoint.
    pub scheduler: Arc<AlertScheduler>,
    /// JWT validator.
    pub auth: Arc<JwtAuth>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish()
    }
}
