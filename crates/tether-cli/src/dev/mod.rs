//! Development server module.
//!
//! Everything between "a config was loaded" and "the user pressed Ctrl+C":
//! - Port negotiation and URL resolution
//! - In-memory compilation with injected prologues
//! - HTTP(S) serving with live reload via Server-Sent Events
//! - Rewriting platform launch configuration to point at the server
//! - A lifecycle with a single-instance guard and graceful stop

pub mod compiler;
pub mod inject;
pub mod lifecycle;
pub mod native;
pub mod port;
pub mod server;
pub mod signal;
pub mod state;
pub mod tls;
pub mod urls;
pub mod watcher;

pub use compiler::{BuildOutput, Compiler};
pub use inject::{AssetInjector, InjectedScript, ScriptPurpose};
pub use lifecycle::{DevServerLifecycle, LifecycleSettings, LifecycleState};
pub use native::{PlatformConfigWriter, PlatformReport};
pub use port::{resolve_host, FallbackPolicy, PortNegotiator, MAX_PROBES};
pub use server::{build_router, DevApp, RouterSettings, RELOAD_SCRIPT_PATH, SSE_PATH};
pub use signal::SignalAdapter;
pub use state::{BuildStatus, BundleCache, DevServerState, SharedState};
pub use urls::{resolve, resolve_with, Protocol, ResolvedUrls, ServerAddress};
pub use watcher::{FileChange, FileWatcher};

use serde::{Deserialize, Serialize};

/// Live-reload client bundled into hot chunks and served at
/// [`RELOAD_SCRIPT_PATH`].
pub(crate) const RELOAD_CLIENT: &str = include_str!("../../assets/dev/reload-client.js");

/// Events pushed to live-reload clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DevEvent {
    BuildStarted,

    BuildCompleted { duration_ms: u64 },

    BuildFailed { error: String },

    ClientConnected { id: usize },
}
