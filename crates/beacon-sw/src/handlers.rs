//! The five worker event handlers.

use beacon_net::Request;
use http::Method;
use tracing::{debug, info};

use crate::cache::{now_millis, CacheEntry};
use crate::events::{
    EventOutcome, FetchEvent, FetchResponse, NotificationClickEvent, PushEvent,
};
use crate::notification::{
    NotificationOptions, ACTION_CLOSE, FALLBACK_BODY, NOTIFICATION_TITLE,
};
use crate::scope::WorkerScope;
use crate::ServiceWorkerError;

/// Pre-cache the manifest into the current generation.
///
/// Every URL is fetched before the cache is touched, so a failure leaves no
/// entries behind for this version.
pub async fn install(scope: &WorkerScope) -> Result<EventOutcome, ServiceWorkerError> {
    let urls = scope.precache_urls()?;
    let mut entries = Vec::with_capacity(urls.len());

    for url in urls {
        let response = scope
            .network()
            .fetch(Request::get(url.clone()))
            .await
            .map_err(|e| ServiceWorkerError::NetworkError(format!("{url}: {e}")))?;
        if !response.ok() {
            return Err(ServiceWorkerError::CacheError(format!(
                "{url} responded with {}",
                response.status
            )));
        }
        entries.push(CacheEntry::from_response(&url, &response));
    }

    let mut caches = scope.caches.write().await;
    let cache = caches.open(scope.cache_name());
    info!(cache = %cache.name, "Opened cache");
    let cached = entries.len();
    for entry in entries {
        cache.put(entry);
    }

    Ok(EventOutcome::Installed {
        cache_name: scope.cache_name().to_string(),
        cached,
    })
}

/// Cache-first: serve from the current generation, else go to the network.
///
/// Misses are not written back.
pub async fn fetch(
    scope: &WorkerScope,
    event: FetchEvent,
) -> Result<EventOutcome, ServiceWorkerError> {
    let request = event.request;

    if request.method == Method::GET {
        let caches = scope.caches.read().await;
        if let Some(entry) = caches
            .get(scope.cache_name())
            .and_then(|cache| cache.match_request(&request.url))
        {
            debug!(url = %request.url, "Cache hit");
            return Ok(EventOutcome::Responded(FetchResponse::from_cache(
                &request.url,
                entry,
            )));
        }
    }

    debug!(url = %request.url, method = %request.method, "Cache miss, fetching");
    let response = scope
        .network()
        .fetch(request)
        .await
        .map_err(|e| ServiceWorkerError::NetworkError(e.to_string()))?;
    Ok(EventOutcome::Responded(FetchResponse::from_network(response)))
}

/// Delete every cache generation except the current one.
pub async fn activate(scope: &WorkerScope) -> Result<EventOutcome, ServiceWorkerError> {
    let mut caches = scope.caches.write().await;
    let stale: Vec<String> = caches
        .keys()
        .into_iter()
        .filter(|name| *name != scope.cache_name())
        .map(str::to_string)
        .collect();

    for name in &stale {
        info!(cache = %name, "Deleting old cache");
        caches.delete(name);
    }

    Ok(EventOutcome::Activated { deleted: stale })
}

/// Render a push payload as a notification.
pub async fn push(
    scope: &WorkerScope,
    event: PushEvent,
) -> Result<EventOutcome, ServiceWorkerError> {
    debug!(bytes = event.data.as_ref().map(|d| d.len()), "Push event received");

    let body = event.text().unwrap_or_else(|| FALLBACK_BODY.to_string());
    let options = NotificationOptions::standard(body, now_millis());
    let id = scope
        .notifications
        .write()
        .await
        .show(NOTIFICATION_TITLE, options);

    Ok(EventOutcome::NotificationShown(id))
}

/// Close the notification, then route on the pressed action.
pub async fn notification_click(
    scope: &WorkerScope,
    event: NotificationClickEvent,
) -> Result<EventOutcome, ServiceWorkerError> {
    debug!(notification = ?event.notification, action = ?event.action, "Notification click received");

    scope.notifications.write().await.close(event.notification);

    match event.action.as_deref() {
        Some(ACTION_CLOSE) => Ok(EventOutcome::ClickHandled { window: None }),
        // explore, unknown actions and a click on the body all open the app
        _ => {
            let root = scope.root_url()?;
            let client = scope.clients.write().await.open_or_focus(root)?;
            Ok(EventOutcome::ClickHandled {
                window: Some(client.id),
            })
        }
    }
}
