//! OneSignal REST client.

use beacon_core::PushConfig;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::error::ApiError;

/// Segment targeted when no user is given.
pub const SUBSCRIBED_SEGMENT: &str = "Subscribed Users";

/// Body of `POST /api/send-notification`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    pub title: Option<String>,
    pub message: Option<String>,
    pub user_id: Option<String>,
    pub url: Option<String>,
}

/// Success body of `POST /api/send-notification`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationResponse {
    pub success: bool,
    pub notification_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipients: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Localized<'a> {
    en: &'a str,
}

/// Who receives the notification.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Target {
    Players { include_player_ids: Vec<String> },
    Segments { included_segments: Vec<String> },
}

impl Target {
    /// One player when a user id is given, every subscriber otherwise.
    pub fn for_user(user_id: Option<&str>) -> Self {
        match user_id.filter(|id| !id.is_empty()) {
            Some(id) => Target::Players {
                include_player_ids: vec![id.to_string()],
            },
            None => Target::Segments {
                included_segments: vec![SUBSCRIBED_SEGMENT.to_string()],
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct VendorNotification<'a> {
    app_id: &'a str,
    headings: Localized<'a>,
    contents: Localized<'a>,
    url: &'a str,
    #[serde(flatten)]
    target: Target,
    chrome_web_icon: &'a str,
    chrome_web_badge: &'a str,
    firefox_icon: &'a str,
    chrome_icon: &'a str,
}

#[derive(Debug, Deserialize)]
struct VendorResponse {
    #[serde(default)]
    id: String,
    recipients: Option<u64>,
    external_id: Option<String>,
    errors: Option<Value>,
}

/// A validated notification ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub user_id: Option<String>,
    pub url: String,
}

impl TryFrom<SendNotificationRequest> for Notification {
    type Error = ApiError;

    fn try_from(req: SendNotificationRequest) -> Result<Self, Self::Error> {
        let title = req.title.filter(|t| !t.is_empty());
        let message = req.message.filter(|m| !m.is_empty());
        let (Some(title), Some(message)) = (title, message) else {
            return Err(ApiError::validation("Title and message are required"));
        };
        Ok(Self {
            title,
            message,
            user_id: req.user_id.filter(|id| !id.is_empty()),
            url: req
                .url
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| "/".to_string()),
        })
    }
}

/// Client for the vendor's notifications endpoint.
pub struct OneSignalClient<'a> {
    http: &'a reqwest::Client,
    endpoint: String,
    app_id: &'a str,
    api_key: &'a str,
    icon: &'a str,
}

impl<'a> OneSignalClient<'a> {
    /// Fails with a configuration error when credentials are missing.
    pub fn new(http: &'a reqwest::Client, config: &'a PushConfig) -> Result<Self, ApiError> {
        let (app_id, api_key) = config.credentials().ok_or_else(|| {
            ApiError::config(
                "OneSignal configuration missing. Please set ONESIGNAL_APP_ID and ONESIGNAL_REST_API_KEY environment variables.",
            )
        })?;
        Ok(Self {
            http,
            endpoint: format!("{}/api/v1/notifications", config.api_url.trim_end_matches('/')),
            app_id,
            api_key,
            icon: &config.icon,
        })
    }

    /// Send one notification.
    pub async fn send(
        &self,
        notification: &Notification,
    ) -> Result<SendNotificationResponse, ApiError> {
        let payload = VendorNotification {
            app_id: self.app_id,
            headings: Localized {
                en: &notification.title,
            },
            contents: Localized {
                en: &notification.message,
            },
            url: &notification.url,
            target: Target::for_user(notification.user_id.as_deref()),
            chrome_web_icon: self.icon,
            chrome_web_badge: self.icon,
            firefox_icon: self.icon,
            chrome_icon: self.icon,
        };
        debug!(payload = ?payload, "Sending notification");

        let response = self
            .http
            .post(&self.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Basic {}", self.api_key),
            )
            .json(&payload)
            .send()
            .await
            .map_err(|e| ApiError::internal("Failed to send notification", e))?;

        let status = response.status();
        info!(status = status.as_u16(), "OneSignal API response");

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::internal("Failed to send notification", e))?;

        if !status.is_success() {
            error!(status = status.as_u16(), body = %text, "OneSignal API error response");
            let details = serde_json::from_str::<Value>(&text)
                .unwrap_or_else(|_| json!({ "message": text }));
            return Err(ApiError::Upstream { status, details });
        }

        let data: VendorResponse = serde_json::from_str(&text)
            .map_err(|e| ApiError::internal("Failed to send notification", e))?;
        info!(id = %data.id, recipients = ?data.recipients, "Notification sent");

        Ok(SendNotificationResponse {
            success: true,
            notification_id: data.id,
            recipients: data.recipients,
            external_id: data.external_id,
            message: "Notification sent successfully".to_string(),
            errors: data.errors,
        })
    }
}
