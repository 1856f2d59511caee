//! Lookup of client secrets by public key.
//!
//! The verifier only ever reads from a store. Registering and removing clients
//! is an administrative concern; [`MemoryClientStore`] supports both so it can
//! back tests and small deployments.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use secrecy::SecretString;

use crate::auth::ApiClient;

/// Resolves the shared secret registered for a public key.
///
/// Implement this over whatever key-value store holds the client registry.
/// Lookups may run concurrently from many requests.
pub trait ClientSecretStore: Send + Sync {
    /// The secret for `public_key`, or `None` if no such client exists.
    fn lookup(&self, public_key: &str) -> Option<SecretString>;
}

impl<T: ClientSecretStore + ?Sized> ClientSecretStore for Arc<T> {
    fn lookup(&self, public_key: &str) -> Option<SecretString> {
        (**self).lookup(public_key)
    }
}

/// In-memory client registry.
#[derive(Default)]
pub struct MemoryClientStore {
    clients: RwLock<HashMap<String, SecretString>>,
}

impl MemoryClientStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `clients`. Later entries replace earlier ones
    /// with the same public key.
    pub fn from_clients(clients: impl IntoIterator<Item = ApiClient>) -> Self {
        let clients = clients
            .into_iter()
            .map(|client| (client.public_key.clone(), client.secret().clone()))
            .collect();
        Self {
            clients: RwLock::new(clients),
        }
    }

    /// Register a client, replacing any secret already stored for its key.
    pub fn register(&self, client: ApiClient) {
        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        clients.insert(client.public_key.clone(), client.secret().clone());
    }

    /// Remove a client. Returns whether it was registered.
    pub fn remove(&self, public_key: &str) -> bool {
        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        clients.remove(public_key).is_some()
    }

    /// Whether a client with this public key is registered.
    pub fn contains(&self, public_key: &str) -> bool {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        clients.contains_key(public_key)
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ClientSecretStore for MemoryClientStore {
    fn lookup(&self, public_key: &str) -> Option<SecretString> {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        clients.get(public_key).cloned()
    }
}

impl std::fmt::Debug for MemoryClientStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryClientStore")
            .field("clients", &self.len())
            .finish()
    }
}
