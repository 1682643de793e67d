//! Port negotiation.
//!
//! A port counts as available when a TCP listener can be bound on it. The
//! probe listener is dropped before the answer is returned, so another
//! process can still take the port before the server binds it.

use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpListener;

use crate::error::{Result, ServerError};
use crate::ui;

/// How many ports past the preferred one are tried.
pub const MAX_PROBES: u16 = 10;

/// What to do when the preferred port is busy and a fallback was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Ask the operator, defaulting to yes
    Prompt,
    /// Take the fallback with a warning
    Accept,
    /// Report the busy port and give up
    Decline,
}

impl FallbackPolicy {
    /// `Prompt` on an attended terminal outside CI, `Accept` otherwise.
    pub fn detect() -> Self {
        if ui::is_interactive() {
            FallbackPolicy::Prompt
        } else {
            FallbackPolicy::Accept
        }
    }
}

/// Finds a bindable port near a preferred one.
#[derive(Debug, Clone)]
pub struct PortNegotiator {
    policy: FallbackPolicy,
    max_probes: u16,
}

impl PortNegotiator {
    pub fn new(policy: FallbackPolicy) -> Self {
        Self {
            policy,
            max_probes: MAX_PROBES,
        }
    }

    pub fn with_max_probes(mut self, max_probes: u16) -> Self {
        self.max_probes = max_probes;
        self
    }

    /// Returns the port to use, or `None` when the operator declined the
    /// fallback.
    ///
    /// # Errors
    ///
    /// [`ServerError::UnresolvableHost`] if `host` has no address, and
    /// [`ServerError::NoOpenPort`] if every candidate is taken.
    pub async fn negotiate(&self, host: &str, preferred: u16) -> Result<Option<u16>> {
        let ip = resolve_host(host).await?;

        if let Some(port) = probe(ip, preferred).await {
            tracing::debug!(host, port, "preferred port is free");
            return Ok(Some(port));
        }

        let Some(fallback) = self.find_fallback(ip, preferred).await else {
            return Err(ServerError::NoOpenPort {
                host: host.to_string(),
                first: preferred,
                last: preferred.saturating_add(self.max_probes),
            }
            .into());
        };

        match self.policy {
            FallbackPolicy::Accept => {
                ui::warning(&format!(
                    "Port {} is busy, using port {} instead",
                    preferred, fallback
                ));
                Ok(Some(fallback))
            }
            FallbackPolicy::Decline => {
                ui::info(&format!("Something is already running on port {}.", preferred));
                Ok(None)
            }
            FallbackPolicy::Prompt => {
                let question = format!(
                    "Something is already running on port {}. Would you like to run the app on another port instead?",
                    preferred
                );
                let accepted =
                    tokio::task::spawn_blocking(move || ui::confirm(&question, true)).await??;
                Ok(accepted.then_some(fallback))
            }
        }
    }

    async fn find_fallback(&self, ip: IpAddr, preferred: u16) -> Option<u16> {
        for offset in 1..=self.max_probes {
            let port = preferred.checked_add(offset)?;
            if let Some(port) = probe(ip, port).await {
                return Some(port);
            }
        }
        None
    }
}

/// First address `host` resolves to.
pub async fn resolve_host(host: &str) -> Result<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let mut addrs = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|_| ServerError::UnresolvableHost(host.to_string()))?;
    addrs
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| ServerError::UnresolvableHost(host.to_string()).into())
}

/// Bind and immediately release. Port 0 yields the ephemeral port chosen.
async fn probe(ip: IpAddr, port: u16) -> Option<u16> {
    let listener = TcpListener::bind(SocketAddr::new(ip, port)).await.ok()?;
    listener.local_addr().ok().map(|addr| addr.port())
}
