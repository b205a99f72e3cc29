//! Notifications shown by the worker and the tray that holds them.

use std::sync::atomic::{AtomicU64, Ordering};

use beacon_core::config::DEFAULT_ICON;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Title of every push notification.
pub const NOTIFICATION_TITLE: &str = "PWA Notification";

/// Body used when a push arrives without usable text.
pub const FALLBACK_BODY: &str = "You have a new notification!";

/// Action id that opens the app.
pub const ACTION_EXPLORE: &str = "explore";

/// Action id that only dismisses.
pub const ACTION_CLOSE: &str = "close";

/// Unique identifier for a displayed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(u64);

impl NotificationId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A button on a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

/// Auxiliary data carried with a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub date_of_arrival: u64,
    pub primary_key: u32,
}

/// `showNotification` options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

impl NotificationOptions {
    /// The fixed push presentation around `body`.
    pub fn standard(body: impl Into<String>, date_of_arrival: u64) -> Self {
        Self {
            body: body.into(),
            icon: DEFAULT_ICON.to_string(),
            badge: DEFAULT_ICON.to_string(),
            vibrate: vec![100, 50, 100],
            data: NotificationData {
                date_of_arrival,
                primary_key: 1,
            },
            actions: vec![
                NotificationAction {
                    action: ACTION_EXPLORE.to_string(),
                    title: "View Details".to_string(),
                    icon: DEFAULT_ICON.to_string(),
                },
                NotificationAction {
                    action: ACTION_CLOSE.to_string(),
                    title: "Close".to_string(),
                    icon: DEFAULT_ICON.to_string(),
                },
            ],
        }
    }
}

/// A displayed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub options: NotificationOptions,
}

/// The set of notifications currently on screen.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    shown: HashMap<NotificationId, Notification>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display a notification.
    pub fn show(&mut self, title: &str, options: NotificationOptions) -> NotificationId {
        let id = NotificationId::new();
        debug!(?id, title, body = %options.body, "Showing notification");
        self.shown.insert(
            id,
            Notification {
                id,
                title: title.to_string(),
                options,
            },
        );
        id
    }

    /// Dismiss a notification. Returns false if it was already gone.
    pub fn close(&mut self, id: NotificationId) -> bool {
        self.shown.remove(&id).is_some()
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.shown.get(&id)
    }

    pub fn len(&self) -> usize {
        self.shown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }
}
