use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tracing::warn;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::infrastructure::NotifyError;
use crate::models::{AppNotification, NewNotification};

/// 组装完整路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/app-notifications", post(create_notification))
        .route(
            "/api/v1/app-notifications/user/{user_id}",
            get(list_by_user),
        )
        .route("/api/v1/app-notifications/read", post(mark_multiple_read))
        .route("/api/v1/app-notifications/{id}/read", post(mark_read))
        .route("/api/v1/app-notifications/{id}", delete(delete_notification))
        .with_state(state)
}

/// GET /health — 存活探针
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/v1/app-notifications/user/:user_id — 按创建时间倒序列出用户通知
async fn list_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<AppNotification>>, NotifyError> {
    let notifications = state.notifications.list_by_user(user_id).await?;
    Ok(Json(notifications))
}

/// POST /api/v1/app-notifications — 创建通知
async fn create_notification(
    State(state): State<AppState>,
    Json(req): Json<NewNotification>,
) -> Result<(StatusCode, Json<AppNotification>), NotifyError> {
    let created = state.notifications.create(req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/v1/app-notifications/:id/read — 标记单条通知已读
async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppNotification>, NotifyError> {
    let updated = state.notifications.mark_read(id).await?;
    Ok(Json(updated))
}

/// POST /api/v1/app-notifications/read — 批量标记已读
///
/// 每个 id 独立处理，失败只记录日志，不影响响应。
async fn mark_multiple_read(
    State(state): State<AppState>,
    Json(ids): Json<Vec<Uuid>>,
) -> Result<StatusCode, NotifyError> {
    let report = state.notifications.mark_multiple_read(&ids).await?;
    if !report.failed.is_empty() {
        warn!(
            failed = report.failed.len(),
            updated = report.updated.len(),
            "batch mark-read had per-id failures"
        );
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/app-notifications/:id — 删除通知，幂等
async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, NotifyError> {
    state.notifications.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
