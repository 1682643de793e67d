//! Dev-server lifecycle: `Created → Starting → Running → Stopping → Stopped`.
//!
//! At most one lifecycle per process may be between `create` and `Stopped`.
//! The guard is the only process-wide state; everything else hangs off the
//! [`DevServerLifecycle`] handle.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tether_native::TargetSet;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::BundlerConfig;
use crate::dev::watcher::{default_ignore_patterns, DEFAULT_DEBOUNCE_MS};
use crate::dev::{
    build_router, resolve_host, tls, Compiler, DevEvent, DevServerState, FileChange, FileWatcher,
    Protocol, RouterSettings, ServerAddress, SharedState,
};
use crate::error::{CliError, Result, ResultExt, ServerError};
use crate::ui;

static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Held from `create` until `Stopped`.
struct InstanceGuard;

impl InstanceGuard {
    fn acquire() -> Result<Self> {
        ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InstanceGuard)
            .map_err(|_| ServerError::AlreadyActive.into())
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        ACTIVE.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Created => "created",
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Where and for whom the server runs.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub project_root: PathBuf,
    /// Negotiated address; the config's own host and port are not consulted
    pub address: ServerAddress,
    pub targets: TargetSet,
}

/// Resources owned while `Running`.
struct Launched {
    local_addr: SocketAddr,
    dev: SharedState,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<Result<()>>,
    watcher: Option<FileWatcher>,
    rebuild: Option<JoinHandle<()>>,
}

impl Launched {
    async fn shut_down(self) -> Result<()> {
        self.dev.close_clients();
        // Receiver gone means the server already exited; its result says why.
        let _ = self.shutdown.send(());

        drop(self.watcher);
        if let Some(rebuild) = self.rebuild {
            rebuild.abort();
            let _ = rebuild.await;
        }

        self.server.await?
    }
}

/// Owns the compiler, the watcher and the HTTP server for one run.
pub struct DevServerLifecycle {
    config: BundlerConfig,
    settings: LifecycleSettings,
    state: watch::Sender<LifecycleState>,
    launched: Mutex<Option<Launched>>,
    guard: parking_lot::Mutex<Option<InstanceGuard>>,
}

impl DevServerLifecycle {
    /// Create a lifecycle in `Created`.
    ///
    /// # Errors
    ///
    /// [`ServerError::AlreadyActive`] while another lifecycle in this process
    /// has not reached `Stopped`.
    pub fn create(config: BundlerConfig, settings: LifecycleSettings) -> Result<Self> {
        let guard = InstanceGuard::acquire()?;
        let (state, _) = watch::channel(LifecycleState::Created);
        Ok(Self {
            config,
            settings,
            state,
            launched: Mutex::new(None),
            guard: parking_lot::Mutex::new(Some(guard)),
        })
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Build, bind and start serving. Resolves once the listener is bound.
    ///
    /// Any failure leaves the lifecycle in `Stopped`.
    ///
    /// # Errors
    ///
    /// Compiler construction and initial build errors unchanged,
    /// [`ServerError::BindFailed`] if the negotiated port was taken in the
    /// meantime, and [`ServerError::InvalidState`] outside `Created`.
    pub async fn start(&self) -> Result<SocketAddr> {
        let mut launched = self.launched.lock().await;

        let current = self.state();
        if current != LifecycleState::Created {
            return Err(ServerError::InvalidState(current.to_string()).into());
        }
        self.transition(LifecycleState::Starting);

        match self.launch().await {
            Ok(run) => {
                let addr = run.local_addr;
                *launched = Some(run);
                self.transition(LifecycleState::Running);
                Ok(addr)
            }
            Err(err) => {
                self.finish();
                Err(err)
            }
        }
    }

    /// Stop serving and release every resource. Resolves in `Stopped`.
    ///
    /// Safe to call any number of times; only the first call does work.
    pub async fn stop(&self) -> Result<()> {
        let mut launched = self.launched.lock().await;

        let Some(run) = launched.take() else {
            if self.state() != LifecycleState::Stopped {
                self.finish();
            }
            return Ok(());
        };

        self.transition(LifecycleState::Stopping);
        let result = run.shut_down().await;
        self.finish();
        result
    }

    async fn launch(&self) -> Result<Launched> {
        let root = &self.settings.project_root;
        let dev_config = self.config.dev_server();

        let compiler = Compiler::new(&self.config, root)?.with_hot(dev_config.hot());
        let dev: SharedState = Arc::new(DevServerState::new());

        dev.start_build();
        match compiler.build().await {
            Ok(output) => {
                ui::success(&format!("Initial build completed in {}ms", output.duration_ms));
                dev.complete_build(output.duration_ms, output.cache);
            }
            Err(err) => {
                dev.fail_build(err.to_string());
                return Err(err);
            }
        }

        let router = build_router(
            &RouterSettings {
                project_root: root.clone(),
                static_dir: dev_config.static_dir(root),
                history_api_fallback: dev_config.history_api_fallback(),
                targets: self.settings.targets.clone(),
                hook: dev_config.on_before_setup_middleware.clone(),
            },
            dev.clone(),
        );

        let acceptor = match self.settings.address.protocol {
            Protocol::Https => Some(
                tls::acceptor(dev_config.tls.as_ref(), root)
                    .with_hint("Check dev_server.tls, or remove it to use a self-signed certificate")?,
            ),
            Protocol::Http => None,
        };

        let ip = resolve_host(&self.settings.address.host).await?;
        let addr = SocketAddr::new(ip, self.settings.address.port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::BindFailed {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;
        tracing::debug!(%local_addr, "listener bound");

        let (watcher, rebuild) = match FileWatcher::new(
            root.clone(),
            default_ignore_patterns(root, &self.config.out_dir, &dev_config.static_dir(root)),
            DEFAULT_DEBOUNCE_MS,
        ) {
            Ok((watcher, changes)) => {
                ui::info(&format!("Watching for changes in {}", watcher.root().display()));
                let task = tokio::spawn(rebuild_on_change(compiler, dev.clone(), changes));
                (Some(watcher), Some(task))
            }
            Err(err) => {
                ui::warning(&format!("File watching unavailable, live reload disabled: {err}"));
                (None, None)
            }
        };

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };
        let server = match acceptor {
            Some(acceptor) => tokio::spawn(tls::serve(listener, router, acceptor, shutdown_signal)),
            None => tokio::spawn(async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(shutdown_signal)
                    .await
                    .map_err(|e| CliError::from(ServerError::Serve(e.to_string())))
            }),
        };

        Ok(Launched {
            local_addr,
            dev,
            shutdown,
            server,
            watcher,
            rebuild,
        })
    }

    fn transition(&self, next: LifecycleState) {
        tracing::debug!(state = %next, "dev server lifecycle");
        self.state.send_replace(next);
    }

    fn finish(&self) {
        self.transition(LifecycleState::Stopped);
        self.guard.lock().take();
    }
}

async fn rebuild_on_change(
    compiler: Compiler,
    dev: SharedState,
    mut changes: mpsc::Receiver<FileChange>,
) {
    while let Some(change) = changes.recv().await {
        // Let the write settle; one rebuild covers a burst of saves.
        tokio::time::sleep(Duration::from_millis(DEFAULT_DEBOUNCE_MS)).await;
        while changes.try_recv().is_ok() {}

        ui::info(&format!("File changed: {}", change.path().display()));
        dev.start_build();
        dev.broadcast(&DevEvent::BuildStarted).await;

        match compiler.build().await {
            Ok(output) => {
                let duration_ms = output.duration_ms;
                dev.complete_build(duration_ms, output.cache);
                ui::success(&format!("Rebuild completed in {}ms", duration_ms));
                dev.broadcast(&DevEvent::BuildCompleted { duration_ms }).await;
            }
            Err(err) => {
                let error = err.to_string();
                dev.fail_build(error.clone());
                ui::error(&format!("Rebuild failed: {}", error));
                dev.broadcast(&DevEvent::BuildFailed { error }).await;
            }
        }
    }
}
