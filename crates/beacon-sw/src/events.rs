//! Events delivered to the worker and what handling them produced.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use url::Url;

use beacon_net::{Request, Response};

use crate::cache::CacheEntry;
use crate::clients::ClientId;
use crate::notification::NotificationId;

/// Kinds of event a worker can handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Push,
    NotificationClick,
}

/// An event dispatched to the worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(FetchEvent),
    Push(PushEvent),
    NotificationClick(NotificationClickEvent),
}

impl WorkerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WorkerEvent::Install => EventKind::Install,
            WorkerEvent::Activate => EventKind::Activate,
            WorkerEvent::Fetch(_) => EventKind::Fetch,
            WorkerEvent::Push(_) => EventKind::Push,
            WorkerEvent::NotificationClick(_) => EventKind::NotificationClick,
        }
    }
}

/// A network request issued by a controlled page.
#[derive(Debug, Clone)]
pub struct FetchEvent {
    pub request: Request,
}

/// A message from the push service.
#[derive(Debug, Clone, Default)]
pub struct PushEvent {
    pub data: Option<Bytes>,
}

impl PushEvent {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: Some(data.into()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Payload as text. Absent, empty and non-UTF-8 payloads all yield `None`.
    pub fn text(&self) -> Option<String> {
        let data = self.data.as_ref()?;
        if data.is_empty() {
            return None;
        }
        std::str::from_utf8(data).ok().map(str::to_string)
    }
}

/// The user interacted with a notification.
#[derive(Debug, Clone)]
pub struct NotificationClickEvent {
    pub notification: NotificationId,
    /// Action button pressed; `None` for a click on the notification body.
    pub action: Option<String>,
}

/// Where a fetch response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

/// Response handed back to the page for a fetch event.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl FetchResponse {
    /// Create a response from cache entry.
    pub fn from_cache(url: &Url, entry: &CacheEntry) -> Self {
        Self {
            url: url.clone(),
            status: entry.status_code(),
            headers: entry.header_map(),
            body: entry.body_bytes(),
            source: ResponseSource::Cache,
        }
    }

    /// Wrap a network response unchanged.
    pub fn from_network(response: Response) -> Self {
        Self {
            url: response.url,
            status: response.status,
            headers: response.headers,
            body: response.body,
            source: ResponseSource::Network,
        }
    }

    pub fn from_cache_hit(&self) -> bool {
        self.source == ResponseSource::Cache
    }
}

/// Result of a handled event.
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed {
        cache_name: String,
        cached: usize,
    },
    Activated {
        deleted: Vec<String>,
    },
    Responded(FetchResponse),
    NotificationShown(NotificationId),
    ClickHandled {
        window: Option<ClientId>,
    },
}
