//! Event kind → handler table.
//!
//! A handler returns a future; the dispatcher awaits it before the event
//! counts as handled, which is what keeps a worker alive until its cache
//! writes, notification display or window open have settled.

use futures::future::BoxFuture;
use hashbrown::HashMap;
use tracing::{debug, warn};

use crate::events::{EventKind, EventOutcome, WorkerEvent};
use crate::handlers;
use crate::scope::WorkerScope;
use crate::ServiceWorkerError;

/// Future returned by a handler.
pub type HandlerFuture<'a> = BoxFuture<'a, Result<EventOutcome, ServiceWorkerError>>;

/// A registered event handler.
pub type Handler = for<'a> fn(&'a WorkerScope, WorkerEvent) -> HandlerFuture<'a>;

/// Maps event kinds to handlers.
pub struct DispatchTable {
    handlers: HashMap<EventKind, Handler>,
}

impl DispatchTable {
    /// A table with no handlers.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register (or replace) the handler for `kind`.
    pub fn on(&mut self, kind: EventKind, handler: Handler) -> &mut Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn handles(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Run the handler for `event` to completion.
    pub async fn dispatch(
        &self,
        scope: &WorkerScope,
        event: WorkerEvent,
    ) -> Result<EventOutcome, ServiceWorkerError> {
        let kind = event.kind();
        let handler = self
            .handlers
            .get(&kind)
            .ok_or_else(|| ServiceWorkerError::NotFound(format!("no handler for {kind:?}")))?;

        debug!(?kind, "Dispatching event");
        let result = handler(scope, event).await;
        if let Err(ref e) = result {
            warn!(?kind, error = %e, "Event handler failed");
        }
        result
    }
}

impl Default for DispatchTable {
    /// The standard worker: all five handlers.
    fn default() -> Self {
        let mut table = Self::empty();
        table
            .on(EventKind::Install, on_install)
            .on(EventKind::Activate, on_activate)
            .on(EventKind::Fetch, on_fetch)
            .on(EventKind::Push, on_push)
            .on(EventKind::NotificationClick, on_notification_click);
        table
    }
}

fn mismatch(expected: EventKind, got: &WorkerEvent) -> ServiceWorkerError {
    ServiceWorkerError::StateError(format!(
        "{expected:?} handler received {:?} event",
        got.kind()
    ))
}

fn on_install(scope: &WorkerScope, event: WorkerEvent) -> HandlerFuture<'_> {
    Box::pin(async move {
        match event {
            WorkerEvent::Install => handlers::install(scope).await,
            other => Err(mismatch(EventKind::Install, &other)),
        }
    })
}

fn on_activate(scope: &WorkerScope, event: WorkerEvent) -> HandlerFuture<'_> {
    Box::pin(async move {
        match event {
            WorkerEvent::Activate => handlers::activate(scope).await,
            other => Err(mismatch(EventKind::Activate, &other)),
        }
    })
}

fn on_fetch(scope: &WorkerScope, event: WorkerEvent) -> HandlerFuture<'_> {
    Box::pin(async move {
        match event {
            WorkerEvent::Fetch(fetch) => handlers::fetch(scope, fetch).await,
            other => Err(mismatch(EventKind::Fetch, &other)),
        }
    })
}

fn on_push(scope: &WorkerScope, event: WorkerEvent) -> HandlerFuture<'_> {
    Box::pin(async move {
        match event {
            WorkerEvent::Push(push) => handlers::push(scope, push).await,
            other => Err(mismatch(EventKind::Push, &other)),
        }
    })
}

fn on_notification_click(scope: &WorkerScope, event: WorkerEvent) -> HandlerFuture<'_> {
    Box::pin(async move {
        match event {
            WorkerEvent::NotificationClick(click) => {
                handlers::notification_click(scope, click).await
            }
            other => Err(mismatch(EventKind::NotificationClick, &other)),
        }
    })
}
