//! # Beacon Server
//!
//! Thin HTTP routes in front of the push vendor, plus the static surface a
//! PWA needs (manifest, worker script, icons).

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use beacon_core::{AppConfig, BeaconResult, PushConfig, ServerConfig, WebAppManifest};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod error;
pub mod onesignal;
pub mod routes;

pub use error::ApiError;
pub use onesignal::{SendNotificationRequest, SendNotificationResponse};

/// Shared state for every route.
#[derive(Clone)]
pub struct AppState {
    pub push: Arc<PushConfig>,
    pub manifest: Arc<WebAppManifest>,
    pub http: reqwest::Client,
}

impl AppState {
    /// Fails when the manifest would not make the app installable.
    pub fn new(push: PushConfig, manifest: WebAppManifest) -> BeaconResult<Self> {
        manifest.validate()?;
        Ok(Self {
            push: Arc::new(push),
            manifest: Arc::new(manifest),
            http: reqwest::Client::new(),
        })
    }
}

/// API routes only.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/send-notification", post(routes::send_notification))
        .route("/api/test-notification", post(routes::test_notification))
        .route("/api/test-simple", post(routes::test_simple))
        .route("/manifest.json", get(routes::manifest))
        .with_state(state)
}

/// Full application: API routes, the worker script and static assets.
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    let script_file = server
        .static_dir
        .join(server.worker_script.trim_start_matches('/'));

    let worker = Router::new()
        .route_service(&server.worker_script, ServeFile::new(script_file))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("service-worker-allowed"),
            HeaderValue::from_static("/"),
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api_router(state)
        .merge(worker)
        .fallback_service(ServeDir::new(&server.static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve until the listener fails or `shutdown` resolves.
pub async fn serve<F>(config: &AppConfig, listener: TcpListener, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let state = AppState::new(config.push.clone(), WebAppManifest::default())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let app = router(state, &config.server);

    info!(addr = %listener.local_addr()?, "Beacon server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
