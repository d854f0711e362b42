//! Adapter over one authenticated remote file-store session.
//!
//! Every domain action (upload, download, folder creation, existence checks,
//! name resolution) is issued as an [`Operation`](crate::exec::Operation) on
//! the store's bounded worker pool. Remote 403/404 responses are reclassified
//! as permission failures and clear the local credential store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::credentials::CredentialStore;
use crate::error::StoreError;
use crate::exec::{Executor, Operation};
use crate::model::Locator;

mod http_client;
mod operations;
mod types;
pub use self::types::*;

/// Shared destination folder used when a publish supplies no explicit parent.
pub const DEFAULT_ROOT_FOLDER: &str = "root";

/// Locator of the canonical version ledger document.
pub const DEFAULT_LEDGER_LOCATOR: &str = "version-ledger";

/// Content type the remote service assigns to folders.
pub const FOLDER_MIME: &str = "application/x-waymark-folder";

pub struct RemoteStore {
    inner: Arc<StoreInner>,
}

impl Clone for RemoteStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct StoreInner {
    base_url: String,
    http: reqwest::blocking::Client,
    credentials: CredentialStore,

    // Single gate serializing credential load and invalidation, so a purge
    // triggered by a failed operation cannot interleave with a concurrent
    // credential read.
    session: Mutex<Option<String>>,

    // id -> display name, populated as a side effect of metadata lookups.
    names: RwLock<HashMap<String, String>>,

    exec: Executor,
}

impl RemoteStore {
    pub fn connect(
        base_url: &str,
        credentials: CredentialStore,
        workers: usize,
    ) -> Result<Self, StoreError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent("waymark")
            .build()
            .map_err(|e| StoreError::transport("build http client", e))?;
        Ok(Self {
            inner: Arc::new(StoreInner {
                base_url: base_url.trim_end_matches('/').to_string(),
                http,
                credentials,
                session: Mutex::new(None),
                names: RwLock::new(HashMap::new()),
                exec: Executor::new(workers),
            }),
        })
    }

    /// Loads and caches the shared credential. Idempotent once cached.
    pub fn authenticate(&self) -> Result<(), StoreError> {
        self.inner.token().map(|_| ())
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn credential_store(&self) -> &CredentialStore {
        &self.inner.credentials
    }
}

impl StoreInner {
    fn token(&self) -> Result<String, StoreError> {
        let mut session = match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(token) = session.as_ref() {
            return Ok(token.clone());
        }
        let creds = self.credentials.load()?;
        *session = Some(creds.token.clone());
        Ok(creds.token)
    }

    fn invalidate(&self) {
        let mut session = match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *session = None;
        // A failure to clear the directory leaves the stale credential in
        // place; the permission error still surfaces to the caller.
        let _ = self.credentials.purge();
    }

    fn remember_name(&self, id: &str, name: &str) {
        if let Ok(mut names) = self.names.write() {
            names.insert(id.to_string(), name.to_string());
        }
    }

    fn cached_name(&self, id: &str) -> Option<String> {
        self.names.read().ok().and_then(|n| n.get(id).cloned())
    }

    fn describe(&self, id: &str) -> String {
        match self.cached_name(id) {
            Some(name) => format!("{} ({})", name, id),
            None => id.to_string(),
        }
    }
}
