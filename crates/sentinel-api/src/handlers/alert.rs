//! Alert CRUD handlers and the manual-check trigger.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use sentinel_core::error::AppError;
use sentinel_database::repositories::alert::AlertChanges;
use sentinel_entity::alert::Alert;

use crate::dto::request::{CreateAlertRequest, UpdateAlertRequest};
use crate::dto::response::{ApiResponse, CheckTriggeredResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/alerts
pub async fn create_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateAlertRequest>,
) -> Result<Json<ApiResponse<Alert>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let rules_json = serde_json::to_value(&req.rules).map_err(AppError::from)?;
    let alert = state
        .alerts
        .create(auth.user_id, &req.name, req.rules.type_name(), &rules_json)
        .await?;

    tracing::info!(
        user_id = %auth.user_id,
        alert_id = %alert.id,
        alert_type = %alert.alert_type,
        "Alert created"
    );

    Ok(Json(ApiResponse::ok(alert)))
}

/// GET /api/alerts
pub async fn list_alerts(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<Alert>>>, ApiError> {
    let alerts = state.alerts.find_by_user(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(alerts)))
}

/// GET /api/alerts/{id}
pub async fn get_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Alert>>, ApiError> {
    let alert = state
        .alerts
        .find_by_id(auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Alert not found"))?;
    Ok(Json(ApiResponse::ok(alert)))
}

/// PUT /api/alerts/{id}
pub async fn update_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAlertRequest>,
) -> Result<Json<ApiResponse<Alert>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let rules = req
        .rules
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(AppError::from)?;

    let changes = AlertChanges {
        name: req.name,
        rules,
        is_active: req.is_active,
    };
    let alert = state.alerts.update(auth.user_id, id, &changes).await?;

    tracing::info!(user_id = %auth.user_id, alert_id = %id, "Alert updated");

    Ok(Json(ApiResponse::ok(alert)))
}

/// DELETE /api/alerts/{id}
pub async fn delete_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.alerts.delete(auth.user_id, id).await?;

    tracing::info!(user_id = %auth.user_id, alert_id = %id, "Alert deleted");

    Ok(Json(
        serde_json::json!({ "success": true, "data": { "message": "Alert deleted" } }),
    ))
}

/// POST /api/alerts/check
///
/// Kicks off one evaluation cycle in the background and acknowledges
/// immediately — outcomes arrive later as push notifications. The run
/// guard makes an overlapping request a no-op.
pub async fn manual_check(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<CheckTriggeredResponse>>, ApiError> {
    tracing::info!(user_id = %auth.user_id, "Manual alert check requested");

    let scheduler = Arc::clone(&state.scheduler);
    tokio::spawn(async move {
        let _ = scheduler.manual_check().await;
    });

    Ok(Json(ApiResponse::ok(CheckTriggeredResponse {
        message: "Alert check triggered".to_string(),
    })))
}
