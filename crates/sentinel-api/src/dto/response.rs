//! Response DTOs.

use serde::{Deserialize, Serialize};

use sentinel_entity::notification::Notification;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Database connectivity.
    pub database: String,
}

/// Notification listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationListResponse {
    /// Notifications, newest first.
    pub notifications: Vec<Notification>,
    /// Number of notifications returned.
    pub count: usize,
}

/// Result of marking all notifications read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    /// How many notifications changed.
    pub marked: u64,
}

/// Acknowledgement for a manual alert check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckTriggeredResponse {
    /// Confirmation message; per-alert outcomes arrive later as push
    /// notifications.
    pub message: String,
}
