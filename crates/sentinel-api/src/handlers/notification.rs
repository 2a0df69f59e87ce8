//! Notification handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use sentinel_entity::notification::Notification;

use crate::dto::request::ListNotificationsQuery;
use crate::dto::response::{ApiResponse, MarkAllReadResponse, NotificationListResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Most notifications a single listing returns.
const LIST_LIMIT: i64 = 50;

/// GET /api/alerts/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<ApiResponse<NotificationListResponse>>, ApiError> {
    let notifications = state
        .notifications
        .find_by_user(auth.user_id, query.include_read, LIST_LIMIT)
        .await?;

    let count = notifications.len();
    Ok(Json(ApiResponse::ok(NotificationListResponse {
        notifications,
        count,
    })))
}

/// PUT /api/alerts/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Notification>>, ApiError> {
    let notification = state.notifications.mark_read(auth.user_id, id).await?;

    tracing::info!(user_id = %auth.user_id, notification_id = %id, "Notification marked as read");

    Ok(Json(ApiResponse::ok(notification)))
}

/// PUT /api/alerts/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<MarkAllReadResponse>>, ApiError> {
    let marked = state.notifications.mark_all_read(auth.user_id).await?;

    tracing::info!(user_id = %auth.user_id, marked, "All notifications marked as read");

    Ok(Json(ApiResponse::ok(MarkAllReadResponse { marked })))
}
