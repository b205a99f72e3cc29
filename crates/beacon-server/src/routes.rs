//! Route handlers.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::error::ApiError;
use crate::onesignal::{
    Notification, OneSignalClient, SendNotificationRequest, SendNotificationResponse,
};
use crate::AppState;

#[derive(Serialize)]
struct SimpleResponse {
    success: bool,
    message: String,
    timestamp: String,
}

/// Validate, check credentials, forward.
async fn send(
    state: &AppState,
    request: SendNotificationRequest,
) -> Result<SendNotificationResponse, ApiError> {
    let notification = Notification::try_from(request)?;
    let client = OneSignalClient::new(&state.http, &state.push)?;
    client.send(&notification).await
}

/// `POST /api/send-notification`
pub async fn send_notification(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match serde_json::from_slice::<SendNotificationRequest>(&body) {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "Error sending notification");
            return ApiError::internal("Failed to send notification", e).into_response();
        }
    };

    match send(&state, request).await {
        Ok(sent) => Json(sent).into_response(),
        Err(e) => {
            error!(error = %e, status = e.status().as_u16(), "Error sending notification");
            e.into_response()
        }
    }
}

/// `POST /api/test-notification`: a fixed notification through the same path.
pub async fn test_notification(State(state): State<AppState>) -> Response {
    let request = SendNotificationRequest {
        title: Some("Test Notification".to_string()),
        message: Some("This is a test notification from your PWA app!".to_string()),
        user_id: None,
        url: Some("/".to_string()),
    };

    match send(&state, request).await {
        Ok(sent) => {
            info!(id = %sent.notification_id, "Test notification sent");
            Json(json!({
                "success": true,
                "message": "Test notification sent successfully",
                "data": sent,
            }))
            .into_response()
        }
        Err(e) => {
            error!(error = %e, "Error sending test notification");
            (
                e.status(),
                Json(json!({
                    "success": false,
                    "error": "Failed to send test notification",
                    "details": e.body(),
                })),
            )
                .into_response()
        }
    }
}

/// `POST /api/test-simple`: liveness probe that never calls the vendor.
pub async fn test_simple(State(state): State<AppState>) -> impl IntoResponse {
    let message = if state.push.credentials().is_some() {
        "Test endpoint working!".to_string()
    } else {
        "Test endpoint working! OneSignal credentials not configured yet.".to_string()
    };

    Json(SimpleResponse {
        success: true,
        message,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `GET /manifest.json`
pub async fn manifest(State(state): State<AppState>) -> Response {
    match state.manifest.to_json() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/manifest+json")],
            body,
        )
            .into_response(),
        Err(e) => ApiError::internal("Failed to render manifest", e).into_response(),
    }
}
