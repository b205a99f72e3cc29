//! Clients API: the windows a worker can open, focus and navigate.

use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use tracing::debug;
use url::Url;

use crate::ServiceWorkerError;

/// Unique identifier for a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

impl ClientId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Client type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientType {
    #[default]
    Window,
    Worker,
}

/// A client (controlled page).
#[derive(Debug, Clone)]
pub struct Client {
    pub id: ClientId,
    pub url: Url,
    pub client_type: ClientType,
    pub focused: bool,
}

impl Client {
    /// A window client at `url`.
    pub fn window(url: Url) -> Self {
        Self {
            id: ClientId::new(),
            url,
            client_type: ClientType::Window,
            focused: false,
        }
    }
}

/// Clients manager.
#[derive(Debug, Default)]
pub struct Clients {
    clients: HashMap<ClientId, Client>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a client by ID.
    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    /// All window clients.
    pub fn windows(&self) -> Vec<&Client> {
        self.clients
            .values()
            .filter(|c| c.client_type == ClientType::Window)
            .collect()
    }

    /// Open a new focused window.
    pub fn open_window(&mut self, url: Url) -> Client {
        for client in self.clients.values_mut() {
            client.focused = false;
        }
        let mut client = Client::window(url);
        client.focused = true;
        debug!(url = %client.url, "Opened window client");
        self.clients.insert(client.id, client.clone());
        client
    }

    /// Focus a client.
    pub fn focus(&mut self, id: ClientId) -> Result<Client, ServiceWorkerError> {
        match self.clients.get(&id) {
            None => return Err(ServiceWorkerError::NotFound(format!("client {id:?}"))),
            Some(c) if c.client_type != ClientType::Window => {
                return Err(ServiceWorkerError::StateError(
                    "Can only focus window clients".to_string(),
                ));
            }
            Some(_) => {}
        }
        let mut focused = None;
        for client in self.clients.values_mut() {
            client.focused = client.id == id;
            if client.focused {
                focused = Some(client.clone());
            }
        }
        focused.ok_or_else(|| ServiceWorkerError::NotFound(format!("client {id:?}")))
    }

    /// Focus an existing window at `url`, or open one.
    pub fn open_or_focus(&mut self, url: Url) -> Result<Client, ServiceWorkerError> {
        let existing = self
            .clients
            .values()
            .find(|c| c.client_type == ClientType::Window && c.url == url)
            .map(|c| c.id);
        match existing {
            Some(id) => self.focus(id),
            None => Ok(self.open_window(url)),
        }
    }

    /// Add a client.
    pub fn add(&mut self, client: Client) {
        self.clients.insert(client.id, client);
    }

    /// Remove a client.
    pub fn remove(&mut self, id: ClientId) -> Option<Client> {
        self.clients.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
