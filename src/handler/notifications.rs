// handler/notifications.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    db::notificationdb::NotificationExt,
    dtos::paymentdtos::{ApiResponse, ListQueryDto, NotificationResponseDto},
    error::{ErrorMessage, HttpError},
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn notifications_handler() -> Router {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:id/read", post(mark_notification_read))
}

pub async fn list_notifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * limit;
    let unread_only = query.unread_only.unwrap_or(false);

    let notifications = app_state
        .db_client
        .get_notifications(auth.user.id, unread_only, limit, offset)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let notifications: Vec<NotificationResponseDto> = notifications
        .into_iter()
        .map(NotificationResponseDto::from)
        .collect();

    Ok(Json(ApiResponse::success("Notifications", notifications)))
}

pub async fn mark_notification_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let notification = app_state
        .db_client
        .mark_notification_read(notification_id, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::PaymentNotFoundOrProcessed.to_string()))?;

    Ok(Json(ApiResponse::success(
        "Notification marked as read",
        NotificationResponseDto::from(notification),
    )))
}
