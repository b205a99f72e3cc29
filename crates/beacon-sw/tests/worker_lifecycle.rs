//! End-to-end worker behaviour over an in-memory network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use beacon_core::WorkerConfig;
use beacon_net::{Fetcher, NetError, Request, Response};
use beacon_sw::{
    handlers, DispatchTable, EventKind, EventOutcome, HandlerFuture, FetchEvent, NotificationClickEvent, PushEvent, ResponseSource,
    ServiceWorkerError, ServiceWorkerEvent, ServiceWorkerHost, ServiceWorkerState, WorkerEvent,
    WorkerScope, FALLBACK_BODY, NOTIFICATION_TITLE,
};
use http::{Method, StatusCode};
use url::Url;

const ORIGIN: &str = "https://app.example/";

#[derive(Default)]
struct MemoryNetwork {
    routes: Mutex<HashMap<String, (StatusCode, String)>>,
    calls: AtomicUsize,
}

impl MemoryNetwork {
    fn with_routes(routes: &[(&str, u16, &str)]) -> Arc<Self> {
        let network = Self::default();
        {
            let mut map = network.routes.lock().unwrap();
            for (path, status, body) in routes {
                map.insert(
                    format!("https://app.example{path}"),
                    (StatusCode::from_u16(*status).unwrap(), body.to_string()),
                );
            }
        }
        Arc::new(network)
    }

    fn set(&self, path: &str, status: u16, body: &str) {
        self.routes.lock().unwrap().insert(
            format!("https://app.example{path}"),
            (StatusCode::from_u16(status).unwrap(), body.to_string()),
        );
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MemoryNetwork {
    async fn fetch(&self, request: Request) -> Result<Response, NetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let routes = self.routes.lock().unwrap();
        match routes.get(request.url.as_str()) {
            Some((status, body)) => Ok(Response::new(request.url.clone(), *status, body.clone())),
            None => Err(NetError::RequestFailed(format!("offline: {}", request.url))),
        }
    }
}

fn full_site() -> Arc<MemoryNetwork> {
    MemoryNetwork::with_routes(&[
        ("/", 200, "<html>home</html>"),
        ("/static/js/bundle.js", 200, "console.log(1)"),
        ("/static/css/main.css", 200, "body{}"),
        ("/manifest.json", 200, "{}"),
        ("/api/data", 200, "fresh"),
    ])
}

fn scope_with(network: Arc<MemoryNetwork>, cache_name: &str) -> WorkerScope {
    let config = WorkerConfig {
        cache_name: cache_name.to_string(),
        ..WorkerConfig::default()
    };
    WorkerScope::new(config, Url::parse(ORIGIN).unwrap(), network)
}

fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

#[tokio::test]
async fn install_populates_every_manifest_url() {
    let scope = scope_with(full_site(), "pwa-cache-v1");
    let table = DispatchTable::default();

    let outcome = table.dispatch(&scope, WorkerEvent::Install).await.unwrap();
    assert!(matches!(outcome, EventOutcome::Installed { cached: 4, .. }));

    let caches = scope.caches.read().await;
    let cache = caches.get("pwa-cache-v1").unwrap();
    assert_eq!(cache.len(), 4);
    assert!(cache.match_request(&url("/static/css/main.css")).is_some());
}

#[tokio::test]
async fn install_is_all_or_nothing() {
    let network = full_site();
    network.set("/static/css/main.css", 404, "missing");
    let scope = scope_with(network, "pwa-cache-v1");

    let result = DispatchTable::default()
        .dispatch(&scope, WorkerEvent::Install)
        .await;
    assert!(matches!(result, Err(ServiceWorkerError::CacheError(_))));
    assert!(!scope.caches.read().await.has("pwa-cache-v1"));
}

#[tokio::test]
async fn install_fails_when_offline() {
    let scope = scope_with(MemoryNetwork::with_routes(&[]), "pwa-cache-v1");
    let result = DispatchTable::default()
        .dispatch(&scope, WorkerEvent::Install)
        .await;
    assert!(matches!(result, Err(ServiceWorkerError::NetworkError(_))));
    assert!(scope.caches.read().await.keys().is_empty());
}

#[tokio::test]
async fn cached_request_never_touches_network() {
    let network = full_site();
    let scope = scope_with(network.clone(), "pwa-cache-v1");
    let table = DispatchTable::default();
    table.dispatch(&scope, WorkerEvent::Install).await.unwrap();
    let after_install = network.calls();

    network.set("/static/js/bundle.js", 200, "changed upstream");
    let event = WorkerEvent::Fetch(FetchEvent {
        request: Request::get(url("/static/js/bundle.js")),
    });
    let EventOutcome::Responded(response) = table.dispatch(&scope, event).await.unwrap() else {
        panic!("fetch must respond");
    };

    assert_eq!(response.source, ResponseSource::Cache);
    assert_eq!(&response.body[..], b"console.log(1)");
    assert_eq!(network.calls(), after_install);
}

#[tokio::test]
async fn miss_goes_to_network_once_without_write_back() {
    let network = full_site();
    let scope = scope_with(network.clone(), "pwa-cache-v1");
    let table = DispatchTable::default();
    table.dispatch(&scope, WorkerEvent::Install).await.unwrap();
    let before = network.calls();

    let event = WorkerEvent::Fetch(FetchEvent {
        request: Request::get(url("/api/data")),
    });
    let EventOutcome::Responded(response) = table.dispatch(&scope, event).await.unwrap() else {
        panic!("fetch must respond");
    };

    assert_eq!(response.source, ResponseSource::Network);
    assert_eq!(&response.body[..], b"fresh");
    assert_eq!(network.calls(), before + 1);

    let caches = scope.caches.read().await;
    assert!(caches
        .get("pwa-cache-v1")
        .unwrap()
        .match_request(&url("/api/data"))
        .is_none());
}

#[tokio::test]
async fn non_get_requests_bypass_cache() {
    let network = full_site();
    let scope = scope_with(network.clone(), "pwa-cache-v1");
    let table = DispatchTable::default();
    table.dispatch(&scope, WorkerEvent::Install).await.unwrap();
    let before = network.calls();

    let mut request = Request::get(url("/"));
    request.method = Method::POST;
    let outcome = table
        .dispatch(&scope, WorkerEvent::Fetch(FetchEvent { request }))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        EventOutcome::Responded(ref r) if r.source == ResponseSource::Network
    ));
    assert_eq!(network.calls(), before + 1);
}

#[tokio::test]
async fn network_failure_on_miss_propagates() {
    let scope = scope_with(full_site(), "pwa-cache-v1");
    let event = WorkerEvent::Fetch(FetchEvent {
        request: Request::get(url("/nowhere")),
    });
    let result = DispatchTable::default().dispatch(&scope, event).await;
    assert!(matches!(result, Err(ServiceWorkerError::NetworkError(_))));
}

#[tokio::test]
async fn activate_converges_to_current_generation() {
    let scope = scope_with(full_site(), "pwa-cache-v3");
    {
        let mut caches = scope.caches.write().await;
        caches.open("pwa-cache-v1");
        caches.open("pwa-cache-v2");
        caches.open("pwa-cache-v3");
        caches.open("something-else");
    }
    let table = DispatchTable::default();

    let outcome = table.dispatch(&scope, WorkerEvent::Activate).await.unwrap();
    let EventOutcome::Activated { mut deleted } = outcome else {
        panic!("activate must report deletions");
    };
    deleted.sort();
    assert_eq!(deleted, vec!["pwa-cache-v1", "pwa-cache-v2", "something-else"]);
    assert_eq!(scope.caches.read().await.keys(), vec!["pwa-cache-v3"]);

    let again = table.dispatch(&scope, WorkerEvent::Activate).await.unwrap();
    assert!(matches!(again, EventOutcome::Activated { ref deleted } if deleted.is_empty()));
    assert_eq!(scope.caches.read().await.keys(), vec!["pwa-cache-v3"]);
}

#[tokio::test]
async fn push_payload_becomes_notification_body() {
    let scope = scope_with(full_site(), "pwa-cache-v1");
    let table = DispatchTable::default();

    let EventOutcome::NotificationShown(id) = table
        .dispatch(&scope, WorkerEvent::Push(PushEvent::new("Hello")))
        .await
        .unwrap()
    else {
        panic!("push must show a notification");
    };

    let center = scope.notifications.read().await;
    let shown = center.get(id).unwrap();
    assert_eq!(shown.title, NOTIFICATION_TITLE);
    assert_eq!(shown.options.body, "Hello");
    assert_eq!(shown.options.actions.len(), 2);
}

#[tokio::test]
async fn empty_push_uses_fallback_text() {
    let scope = scope_with(full_site(), "pwa-cache-v1");
    let table = DispatchTable::default();

    for event in [PushEvent::empty(), PushEvent::new("")] {
        let EventOutcome::NotificationShown(id) = table
            .dispatch(&scope, WorkerEvent::Push(event))
            .await
            .unwrap()
        else {
            panic!("push must show a notification");
        };
        let center = scope.notifications.read().await;
        assert_eq!(center.get(id).unwrap().options.body, FALLBACK_BODY);
    }
}

async fn show_one(scope: &WorkerScope, table: &DispatchTable) -> beacon_sw::NotificationId {
    match table
        .dispatch(scope, WorkerEvent::Push(PushEvent::new("hi")))
        .await
        .unwrap()
    {
        EventOutcome::NotificationShown(id) => id,
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn close_action_only_dismisses() {
    let scope = scope_with(full_site(), "pwa-cache-v1");
    let table = DispatchTable::default();
    let id = show_one(&scope, &table).await;

    let outcome = table
        .dispatch(
            &scope,
            WorkerEvent::NotificationClick(NotificationClickEvent {
                notification: id,
                action: Some("close".to_string()),
            }),
        )
        .await
        .unwrap();

    assert!(matches!(outcome, EventOutcome::ClickHandled { window: None }));
    assert!(scope.notifications.read().await.get(id).is_none());
    assert!(scope.clients.read().await.is_empty());
}

#[tokio::test]
async fn explore_and_body_clicks_open_root_window() {
    let scope = scope_with(full_site(), "pwa-cache-v1");
    let table = DispatchTable::default();

    for action in [Some("explore".to_string()), None, Some("other".to_string())] {
        let id = show_one(&scope, &table).await;
        let outcome = table
            .dispatch(
                &scope,
                WorkerEvent::NotificationClick(NotificationClickEvent {
                    notification: id,
                    action,
                }),
            )
            .await
            .unwrap();

        let EventOutcome::ClickHandled { window: Some(client) } = outcome else {
            panic!("a window must be opened");
        };
        assert!(scope.notifications.read().await.get(id).is_none());
        let clients = scope.clients.read().await;
        assert_eq!(clients.get(client).unwrap().url, url("/"));
    }

    // the root window is focused rather than duplicated
    assert_eq!(scope.clients.read().await.len(), 1);
}

#[tokio::test]
async fn unregistered_kind_is_rejected() {
    let scope = scope_with(full_site(), "pwa-cache-v1");
    let table = DispatchTable::empty();
    let result = table.dispatch(&scope, WorkerEvent::Install).await;
    assert!(matches!(result, Err(ServiceWorkerError::NotFound(_))));
}

#[tokio::test]
async fn host_registers_installs_and_activates() {
    let network = full_site();
    let scope = Arc::new(scope_with(network.clone(), "pwa-cache-v2"));
    scope.caches.write().await.open("pwa-cache-v1");
    let (host, mut events) = ServiceWorkerHost::new(scope.clone(), DispatchTable::default());

    host.register("/sw.js").await.unwrap();

    let active = host.active().await.unwrap();
    assert_eq!(active.state, ServiceWorkerState::Activated);
    assert_eq!(scope.caches.read().await.keys(), vec!["pwa-cache-v2"]);

    let mut states = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let beacon_sw::ServiceWorkerEvent::StateChange { new_state, .. } = event {
            states.push(new_state);
        }
    }
    assert_eq!(
        states,
        vec![
            ServiceWorkerState::Installing,
            ServiceWorkerState::Activating,
            ServiceWorkerState::Activated,
        ]
    );

    let response = host.fetch(Request::get(url("/"))).await.unwrap();
    assert!(response.from_cache_hit());
}

#[tokio::test]
async fn failed_install_leaves_no_active_worker() {
    let network = full_site();
    network.set("/manifest.json", 500, "oops");
    let scope = Arc::new(scope_with(network.clone(), "pwa-cache-v1"));
    let (host, _events) = ServiceWorkerHost::new(scope.clone(), DispatchTable::default());

    assert!(host.register("/sw.js").await.is_err());
    assert!(host.active().await.is_none());
    assert!(scope.caches.read().await.keys().is_empty());

    // uncontrolled pages go straight to the network
    let before = network.calls();
    let response = host.fetch(Request::get(url("/"))).await.unwrap();
    assert_eq!(response.source, ResponseSource::Network);
    assert_eq!(network.calls(), before + 1);

    assert!(matches!(
        host.push(PushEvent::new("x")).await,
        Err(ServiceWorkerError::StateError(_))
    ));
}

#[tokio::test]
async fn new_version_replaces_old_worker() {
    let network = full_site();
    let caches = {
        let scope = Arc::new(scope_with(network.clone(), "pwa-cache-v1"));
        let (host, _events) = ServiceWorkerHost::new(scope.clone(), DispatchTable::default());
        host.register("/sw.js").await.unwrap();
        scope.caches.clone()
    };

    let scope = Arc::new(scope_with(network, "pwa-cache-v2").with_caches(caches.clone()));
    let (host, _events) = ServiceWorkerHost::new(scope, DispatchTable::default());
    host.register("/sw.js").await.unwrap();

    assert_eq!(caches.read().await.keys(), vec!["pwa-cache-v2"]);
}

static ACTIVATIONS: AtomicUsize = AtomicUsize::new(0);

/// Activates once, then fails every later activation.
fn activate_once(scope: &WorkerScope, _event: WorkerEvent) -> HandlerFuture<'_> {
    Box::pin(async move {
        if ACTIVATIONS.fetch_add(1, Ordering::SeqCst) == 0 {
            handlers::activate(scope).await
        } else {
            Err(ServiceWorkerError::CacheError("cleanup failed".to_string()))
        }
    })
}

#[tokio::test]
async fn failed_activation_keeps_previous_worker_in_control() {
    let scope = Arc::new(scope_with(full_site(), "pwa-cache-v1"));
    let mut table = DispatchTable::default();
    table.on(EventKind::Activate, activate_once);
    let (host, mut events) = ServiceWorkerHost::new(scope.clone(), table);

    let first = host.register("/sw.js").await.unwrap();
    while events.try_recv().is_ok() {}

    let result = host.register("/sw.js").await;
    assert!(matches!(result, Err(ServiceWorkerError::CacheError(_))));

    let active = host.active().await.unwrap();
    assert_eq!(active.id, first);
    assert_eq!(active.state, ServiceWorkerState::Activated);

    let waiting = host.waiting().await.unwrap();
    assert_ne!(waiting.id, first);
    assert_eq!(waiting.state, ServiceWorkerState::Installed);

    let mut states = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let ServiceWorkerEvent::StateChange { new_state, .. } = event {
            states.push(new_state);
        }
    }
    assert_eq!(states.last(), Some(&ServiceWorkerState::Installed));

    let response = host.fetch(Request::get(url("/"))).await.unwrap();
    assert!(response.from_cache_hit());
}
