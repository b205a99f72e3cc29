//! Registration and the install → activate lifecycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use beacon_net::Request;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info, warn};
use url::Url;

use crate::dispatch::DispatchTable;
use crate::events::{
    EventOutcome, FetchEvent, FetchResponse, NotificationClickEvent, PushEvent, WorkerEvent,
};
use crate::notification::NotificationId;
use crate::scope::WorkerScope;
use crate::ServiceWorkerError;

/// Unique identifier for a service worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceWorkerId(u64);

impl ServiceWorkerId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Service worker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ServiceWorkerState {
    /// Initial state, script being parsed.
    #[default]
    Parsed,
    /// Installing (install event).
    Installing,
    /// Installed but waiting for activation.
    Installed,
    /// Activating (activate event).
    Activating,
    /// Active and controlling pages.
    Activated,
    /// Redundant (replaced or install failed).
    Redundant,
}

/// A service worker instance.
#[derive(Debug, Clone)]
pub struct ServiceWorker {
    pub id: ServiceWorkerId,
    pub script_url: Url,
    pub state: ServiceWorkerState,
    /// Error message if install failed.
    pub error: Option<String>,
    pub state_changed_at: Instant,
}

impl ServiceWorker {
    pub fn new(script_url: Url) -> Self {
        Self {
            id: ServiceWorkerId::new(),
            script_url,
            state: ServiceWorkerState::Parsed,
            error: None,
            state_changed_at: Instant::now(),
        }
    }

    pub fn set_state(&mut self, state: ServiceWorkerState) {
        self.state = state;
        self.state_changed_at = Instant::now();
    }

    pub fn is_active(&self) -> bool {
        self.state == ServiceWorkerState::Activated
    }

    pub fn is_redundant(&self) -> bool {
        self.state == ServiceWorkerState::Redundant
    }
}

/// A service worker registration.
#[derive(Debug)]
pub struct ServiceWorkerRegistration {
    pub scope: Url,
    pub installing: Option<ServiceWorker>,
    pub waiting: Option<ServiceWorker>,
    pub active: Option<ServiceWorker>,
}

impl ServiceWorkerRegistration {
    pub fn new(scope: Url) -> Self {
        Self {
            scope,
            installing: None,
            waiting: None,
            active: None,
        }
    }

    /// Start installing a new worker for `script_url`.
    pub fn update(&mut self, script_url: Url) -> ServiceWorkerId {
        let mut worker = ServiceWorker::new(script_url);
        worker.set_state(ServiceWorkerState::Installing);
        let id = worker.id;
        self.installing = Some(worker);
        id
    }

    /// Transition installing to waiting.
    pub fn install_complete(&mut self) {
        if let Some(mut worker) = self.installing.take() {
            worker.set_state(ServiceWorkerState::Installed);
            self.waiting = Some(worker);
        }
    }

    /// Discard the installing worker.
    pub fn install_failed(&mut self, reason: String) -> Option<ServiceWorker> {
        self.installing.take().map(|mut worker| {
            worker.set_state(ServiceWorkerState::Redundant);
            worker.error = Some(reason);
            worker
        })
    }

    /// Move the waiting worker to activating.
    pub fn begin_activation(&mut self) -> Option<ServiceWorkerId> {
        let worker = self.waiting.as_mut()?;
        worker.set_state(ServiceWorkerState::Activating);
        Some(worker.id)
    }

    /// Put the activating worker back to waiting.
    pub fn activation_failed(&mut self) -> Option<ServiceWorkerId> {
        let worker = self.waiting.as_mut()?;
        worker.set_state(ServiceWorkerState::Installed);
        Some(worker.id)
    }

    /// Promote the activating worker, retiring the previous one.
    pub fn activate(&mut self) {
        if let Some(mut worker) = self.waiting.take() {
            if let Some(mut old) = self.active.take() {
                old.set_state(ServiceWorkerState::Redundant);
            }
            worker.set_state(ServiceWorkerState::Activated);
            self.active = Some(worker);
        }
    }

    pub fn get_active(&self) -> Option<&ServiceWorker> {
        self.active.as_ref()
    }

    /// Unregister (mark every worker redundant).
    pub fn unregister(&mut self) {
        for mut worker in [
            self.active.take(),
            self.waiting.take(),
            self.installing.take(),
        ]
        .into_iter()
        .flatten()
        {
            worker.set_state(ServiceWorkerState::Redundant);
        }
    }
}

/// Lifecycle notifications emitted by the host.
#[derive(Debug, Clone)]
pub enum ServiceWorkerEvent {
    StateChange {
        worker_id: ServiceWorkerId,
        new_state: ServiceWorkerState,
    },
    UpdateFound {
        scope: String,
    },
    ControllerChange {
        worker_id: ServiceWorkerId,
    },
}

/// Hosts one worker registration and routes browser events to it.
pub struct ServiceWorkerHost {
    scope: Arc<WorkerScope>,
    table: DispatchTable,
    registration: RwLock<Option<ServiceWorkerRegistration>>,
    event_tx: mpsc::UnboundedSender<ServiceWorkerEvent>,
}

impl ServiceWorkerHost {
    pub fn new(
        scope: Arc<WorkerScope>,
        table: DispatchTable,
    ) -> (Self, mpsc::UnboundedReceiver<ServiceWorkerEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (
            Self {
                scope,
                table,
                registration: RwLock::new(None),
                event_tx,
            },
            event_rx,
        )
    }

    pub fn scope(&self) -> &WorkerScope {
        &self.scope
    }

    fn emit(&self, event: ServiceWorkerEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Register the worker script, then install and activate it.
    ///
    /// A failed install leaves the previous active worker (if any) in control.
    pub async fn register(&self, script_path: &str) -> Result<ServiceWorkerId, ServiceWorkerError> {
        let result = self.register_inner(script_path).await;
        match &result {
            Ok(id) => info!(worker = ?id, script = script_path, "ServiceWorker registration successful"),
            Err(e) => error!(script = script_path, error = %e, "ServiceWorker registration failed"),
        }
        result
    }

    async fn register_inner(&self, script_path: &str) -> Result<ServiceWorkerId, ServiceWorkerError> {
        let script_url = self
            .scope
            .resolve(script_path)
            .map_err(|e| ServiceWorkerError::RegistrationFailed(e.to_string()))?;
        let scope_url = script_scope(&script_url);

        let worker_id = {
            let mut registration = self.registration.write().await;
            let registration =
                registration.get_or_insert_with(|| ServiceWorkerRegistration::new(scope_url.clone()));
            registration.update(script_url)
        };
        self.emit(ServiceWorkerEvent::UpdateFound {
            scope: scope_url.to_string(),
        });
        self.emit(ServiceWorkerEvent::StateChange {
            worker_id,
            new_state: ServiceWorkerState::Installing,
        });

        if let Err(e) = self.table.dispatch(&self.scope, WorkerEvent::Install).await {
            warn!(worker = ?worker_id, error = %e, "Install failed, worker is redundant");
            if let Some(registration) = self.registration.write().await.as_mut() {
                registration.install_failed(e.to_string());
            }
            self.emit(ServiceWorkerEvent::StateChange {
                worker_id,
                new_state: ServiceWorkerState::Redundant,
            });
            return Err(e);
        }

        {
            let mut registration = self.registration.write().await;
            if let Some(registration) = registration.as_mut() {
                registration.install_complete();
                registration.begin_activation();
            }
        }
        self.emit(ServiceWorkerEvent::StateChange {
            worker_id,
            new_state: ServiceWorkerState::Activating,
        });

        if let Err(e) = self.table.dispatch(&self.scope, WorkerEvent::Activate).await {
            warn!(worker = ?worker_id, error = %e, "Activate failed, worker stays waiting");
            if let Some(registration) = self.registration.write().await.as_mut() {
                registration.activation_failed();
            }
            self.emit(ServiceWorkerEvent::StateChange {
                worker_id,
                new_state: ServiceWorkerState::Installed,
            });
            return Err(e);
        }

        if let Some(registration) = self.registration.write().await.as_mut() {
            registration.activate();
        }
        self.emit(ServiceWorkerEvent::StateChange {
            worker_id,
            new_state: ServiceWorkerState::Activated,
        });
        self.emit(ServiceWorkerEvent::ControllerChange { worker_id });

        Ok(worker_id)
    }

    /// State of the active worker, if any.
    pub async fn active(&self) -> Option<ServiceWorker> {
        self.registration
            .read()
            .await
            .as_ref()
            .and_then(|r| r.get_active().cloned())
    }

    /// The installed worker waiting to take over, if any.
    pub async fn waiting(&self) -> Option<ServiceWorker> {
        self.registration
            .read()
            .await
            .as_ref()
            .and_then(|r| r.waiting.clone())
    }

    /// Unregister; subsequent fetches bypass the worker.
    pub async fn unregister(&self) -> bool {
        match self.registration.write().await.take() {
            Some(mut registration) => {
                registration.unregister();
                true
            }
            None => false,
        }
    }

    async fn require_active(&self) -> Result<(), ServiceWorkerError> {
        match self.active().await {
            Some(_) => Ok(()),
            None => Err(ServiceWorkerError::StateError(
                "no active service worker".to_string(),
            )),
        }
    }

    /// Route a page request through the active worker, or straight to the
    /// network when the page is uncontrolled.
    pub async fn fetch(&self, request: Request) -> Result<FetchResponse, ServiceWorkerError> {
        if self.active().await.is_none() {
            let response = self
                .scope
                .network()
                .fetch(request)
                .await
                .map_err(|e| ServiceWorkerError::NetworkError(e.to_string()))?;
            return Ok(FetchResponse::from_network(response));
        }

        match self
            .table
            .dispatch(&self.scope, WorkerEvent::Fetch(FetchEvent { request }))
            .await?
        {
            EventOutcome::Responded(response) => Ok(response),
            other => Err(unexpected(other)),
        }
    }

    /// Deliver a push message.
    pub async fn push(&self, event: PushEvent) -> Result<NotificationId, ServiceWorkerError> {
        self.require_active().await?;
        match self.table.dispatch(&self.scope, WorkerEvent::Push(event)).await? {
            EventOutcome::NotificationShown(id) => Ok(id),
            other => Err(unexpected(other)),
        }
    }

    /// Deliver a notification click.
    pub async fn notification_click(
        &self,
        event: NotificationClickEvent,
    ) -> Result<EventOutcome, ServiceWorkerError> {
        self.require_active().await?;
        self.table
            .dispatch(&self.scope, WorkerEvent::NotificationClick(event))
            .await
    }
}

fn unexpected(outcome: EventOutcome) -> ServiceWorkerError {
    ServiceWorkerError::StateError(format!("unexpected handler outcome {outcome:?}"))
}

/// Default scope: the directory containing the script.
fn script_scope(script_url: &Url) -> Url {
    let mut scope = script_url.clone();
    let dir = script_url
        .path()
        .rsplit_once('/')
        .map(|(p, _)| format!("{p}/"))
        .unwrap_or_else(|| "/".to_string());
    scope.set_path(&dir);
    scope.set_query(None);
    scope.set_fragment(None);
    scope
}
