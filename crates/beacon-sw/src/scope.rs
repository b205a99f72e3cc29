//! The worker global scope: configuration plus the state handlers act on.

use std::sync::Arc;

use beacon_core::WorkerConfig;
use beacon_net::Fetcher;
use tokio::sync::RwLock;
use url::Url;

use crate::cache::CacheStorage;
use crate::clients::Clients;
use crate::notification::NotificationCenter;
use crate::ServiceWorkerError;

/// Everything a handler may read or mutate.
///
/// The cache store is the only state that outlives a worker process; clients
/// and notifications belong to the host browser.
pub struct WorkerScope {
    pub config: WorkerConfig,
    pub origin: Url,
    pub caches: Arc<RwLock<CacheStorage>>,
    pub clients: Arc<RwLock<Clients>>,
    pub notifications: Arc<RwLock<NotificationCenter>>,
    network: Arc<dyn Fetcher>,
}

impl WorkerScope {
    pub fn new(config: WorkerConfig, origin: Url, network: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            origin,
            caches: Arc::new(RwLock::new(CacheStorage::new())),
            clients: Arc::new(RwLock::new(Clients::new())),
            notifications: Arc::new(RwLock::new(NotificationCenter::new())),
            network,
        }
    }

    /// Share an existing cache store, e.g. one that survived a previous worker.
    pub fn with_caches(mut self, caches: Arc<RwLock<CacheStorage>>) -> Self {
        self.caches = caches;
        self
    }

    pub fn network(&self) -> &dyn Fetcher {
        self.network.as_ref()
    }

    /// Current cache generation.
    pub fn cache_name(&self) -> &str {
        &self.config.cache_name
    }

    /// Resolve a path against the worker origin.
    pub fn resolve(&self, path: &str) -> Result<Url, ServiceWorkerError> {
        self.origin
            .join(path)
            .map_err(|e| ServiceWorkerError::InvalidUrl(format!("{path}: {e}")))
    }

    /// The application's root window URL.
    pub fn root_url(&self) -> Result<Url, ServiceWorkerError> {
        self.resolve("/")
    }

    /// Pre-cache manifest resolved to absolute URLs.
    pub fn precache_urls(&self) -> Result<Vec<Url>, ServiceWorkerError> {
        self.config.precache.iter().map(|p| self.resolve(p)).collect()
    }
}
