//! Shared state for the development server.
//!
//! Holds the last good bundle, the build status and the connected
//! live-reload clients behind parking_lot locks.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::dev::DevEvent;

/// Build status tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// No build has been performed yet
    NotStarted,
    /// Build is currently in progress
    InProgress { started_at: Instant },
    /// Build completed successfully
    Success { duration_ms: u64 },
    /// Build failed with error
    Failed { error: String },
}

impl BuildStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, BuildStatus::InProgress { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success { .. })
    }

    /// Get error message if failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            BuildStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// In-memory bundle: URL path -> (content, content-type).
#[derive(Debug, Clone, Default)]
pub struct BundleCache {
    files: HashMap<String, (Vec<u8>, String)>,
}

impl BundleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file under its URL path (e.g. "/index.js").
    pub fn insert(&mut self, path: String, content: Vec<u8>, content_type: String) {
        self.files.insert(path, (content, content_type));
    }

    pub fn get(&self, path: &str) -> Option<&(Vec<u8>, String)> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files
            .iter()
            .map(|(path, (content, _))| (path.as_str(), content.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

type ClientRegistry = RwLock<HashMap<usize, mpsc::Sender<String>>>;

/// Shared development server state.
pub struct DevServerState {
    status: RwLock<BuildStatus>,
    cache: RwLock<BundleCache>,
    clients: ClientRegistry,
    next_client_id: AtomicUsize,
    closed: AtomicBool,
}

impl Default for DevServerState {
    fn default() -> Self {
        Self::new()
    }
}

impl DevServerState {
    pub fn new() -> Self {
        Self {
            status: RwLock::new(BuildStatus::NotStarted),
            cache: RwLock::new(BundleCache::new()),
            clients: RwLock::new(HashMap::new()),
            next_client_id: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn start_build(&self) {
        *self.status.write() = BuildStatus::InProgress {
            started_at: Instant::now(),
        };
    }

    /// Record a successful build and swap in its bundle.
    pub fn complete_build(&self, duration_ms: u64, cache: BundleCache) {
        *self.cache.write() = cache;
        *self.status.write() = BuildStatus::Success { duration_ms };
    }

    /// Record a failed build. The previous bundle stays served.
    pub fn fail_build(&self, error: String) {
        *self.status.write() = BuildStatus::Failed { error };
    }

    pub fn status(&self) -> BuildStatus {
        self.status.read().clone()
    }

    pub fn cached_file(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.cache.read().get(path).cloned()
    }

    /// Register a live-reload client.
    ///
    /// After [`close_clients`](Self::close_clients) the returned receiver is
    /// already closed, so the stream ends immediately.
    pub fn register_client(&self) -> (usize, mpsc::Receiver<String>) {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(100);
        if !self.closed.load(Ordering::Acquire) {
            self.clients.write().insert(id, tx);
        }
        (id, rx)
    }

    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    /// Send an event to every connected client, dropping ones that are gone.
    pub async fn broadcast(&self, event: &DevEvent) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode dev event");
                return;
            }
        };

        let clients: Vec<(usize, mpsc::Sender<String>)> = self
            .clients
            .read()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut gone = Vec::new();
        for (id, tx) in clients {
            if tx.send(json.clone()).await.is_err() {
                gone.push(id);
            }
        }

        for id in gone {
            self.unregister_client(id);
        }
    }

    /// End every live-reload stream and refuse new ones.
    pub fn close_clients(&self) {
        self.closed.store(true, Ordering::Release);
        let dropped = std::mem::take(&mut *self.clients.write());
        tracing::debug!(clients = dropped.len(), "closed live-reload streams");
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }
}

/// Shared state handle for passing around the application.
pub type SharedState = Arc<DevServerState>;
