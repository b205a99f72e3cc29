//! # Beacon Service Worker
//!
//! The worker half of the Beacon PWA, expressed as plain Rust over an
//! explicit event dispatch table.
//!
//! ## Features
//!
//! - **Install**: pre-cache a fixed manifest, all or nothing
//! - **Fetch**: cache-first, network on miss, no write-back
//! - **Activate**: delete every cache generation but the current one
//! - **Push**: render the payload as a notification with fixed actions
//! - **Notification click**: close, then open the app unless "close" was chosen
//!
//! ## Architecture
//!
//! ```text
//! ServiceWorkerHost
//!     ├── ServiceWorkerRegistration (installing / waiting / active)
//!     ├── DispatchTable (EventKind → handler)
//!     └── WorkerScope
//!             ├── WorkerConfig (cache name, pre-cache list)
//!             ├── CacheStorage ── Cache ── URL → CacheEntry
//!             ├── Clients
//!             ├── NotificationCenter
//!             └── Fetcher (network)
//! ```

use thiserror::Error;

pub mod cache;
pub mod clients;
pub mod dispatch;
pub mod events;
pub mod handlers;
pub mod notification;
pub mod page;
pub mod registration;
pub mod scope;

pub use cache::{Cache, CacheEntry, CacheStorage};
pub use clients::{Client, ClientId, ClientType, Clients};
pub use dispatch::{DispatchTable, Handler, HandlerFuture};
pub use events::{
    EventKind, EventOutcome, FetchEvent, FetchResponse, NotificationClickEvent, PushEvent,
    ResponseSource, WorkerEvent,
};
pub use notification::{
    Notification, NotificationCenter, NotificationId, NotificationOptions, FALLBACK_BODY,
    NOTIFICATION_TITLE,
};
pub use page::{
    InstallOutcome, InstallPrompt, InstallPromptSlot, PageError, PushSdk, SubscriptionState,
    SubscriptionTracker,
};
pub use registration::{
    ServiceWorker, ServiceWorkerEvent, ServiceWorkerHost, ServiceWorkerId,
    ServiceWorkerRegistration, ServiceWorkerState,
};
pub use scope::WorkerScope;

/// Errors that can occur in service worker operations.
#[derive(Error, Debug, Clone)]
pub enum ServiceWorkerError {
    #[error("Registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("State error: {0}")]
    StateError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
