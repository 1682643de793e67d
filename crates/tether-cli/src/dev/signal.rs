//! Shutdown signal handling.

use std::sync::Arc;

use tokio::sync::watch;

/// Latches the first Ctrl+C or SIGTERM.
///
/// A signal that arrives before anyone calls [`SignalAdapter::wait`] is not
/// lost: the flag stays set and `wait` returns immediately.
#[derive(Debug, Clone)]
pub struct SignalAdapter {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl SignalAdapter {
    /// Listen for OS signals in a background task.
    pub fn install() -> Self {
        let adapter = Self::manual();
        let tx = adapter.tx.clone();
        tokio::spawn(async move {
            wait_for_os_signal().await;
            tracing::debug!("shutdown signal received");
            tx.send_replace(true);
        });
        adapter
    }

    /// An adapter that only fires through [`SignalAdapter::trigger`].
    pub fn manual() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        // The sender lives in `self`, so this only returns once fired.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

async fn wait_for_os_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "could not listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
