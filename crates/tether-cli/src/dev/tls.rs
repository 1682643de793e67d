//! HTTPS for the dev server.
//!
//! Uses the configured PEM pair when given, otherwise a self-signed
//! certificate for `localhost` generated at startup.

use std::fs::File;
use std::future::Future;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::{conn::auto::Builder, graceful::GracefulShutdown},
    service::TowerToHyperService,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::ServerConfig;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

use crate::config::TlsConfig;
use crate::error::{Result, ServerError};

/// Build a TLS acceptor. Relative certificate paths resolve against
/// `project_root`.
pub fn acceptor(tls: Option<&TlsConfig>, project_root: &Path) -> Result<TlsAcceptor> {
    let (certs, key) = match tls {
        Some(tls) => load_pem(&project_root.join(&tls.cert), &project_root.join(&tls.key))?,
        None => self_signed()?,
    };

    let mut config = ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(tls_error)?
    .with_no_client_auth()
    .with_single_cert(certs, key)
    .map_err(tls_error)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_pem(
    cert: &Path,
    key: &Path,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let open = |path: &Path| {
        File::open(path)
            .map(BufReader::new)
            .map_err(|e| ServerError::Tls(format!("{}: {}", path.display(), e)))
    };

    let certs = rustls_pemfile::certs(&mut open(cert)?)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ServerError::Tls(format!("{}: {}", cert.display(), e)))?;
    if certs.is_empty() {
        return Err(ServerError::Tls(format!("{}: no certificates found", cert.display())).into());
    }

    let key = rustls_pemfile::private_key(&mut open(key)?)
        .map_err(|e| ServerError::Tls(format!("{}: {}", key.display(), e)))?
        .ok_or_else(|| ServerError::Tls(format!("{}: no private key found", key.display())))?;

    Ok((certs, key))
}

fn self_signed() -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    tracing::debug!("generating self-signed certificate for localhost");
    let key_pair = rcgen::KeyPair::generate().map_err(tls_error)?;
    let params = rcgen::CertificateParams::new(vec![
        "localhost".to_string(),
        "127.0.0.1".to_string(),
    ])
    .map_err(tls_error)?;
    let cert = params.self_signed(&key_pair).map_err(tls_error)?;

    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));
    Ok((vec![cert.der().clone()], key))
}

fn tls_error(err: impl std::fmt::Display) -> ServerError {
    ServerError::Tls(err.to_string())
}

/// Accept TLS connections until `shutdown` resolves, then drain open
/// connections.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    acceptor: TlsAcceptor,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        tracing::warn!(error = %err, "accept failed");
                        continue;
                    }
                };

                let acceptor = acceptor.clone();
                let service = TowerToHyperService::new(router.clone());
                let watcher = graceful.watcher();
                tokio::spawn(async move {
                    let stream = match acceptor.accept(stream).await {
                        Ok(stream) => stream,
                        Err(err) => {
                            tracing::debug!(%peer, error = %err, "TLS handshake failed");
                            return;
                        }
                    };

                    let builder = Builder::new(TokioExecutor::new());
                    let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
                    if let Err(err) = watcher.watch(conn).await {
                        tracing::debug!(%peer, error = %err, "connection closed with error");
                    }
                });
            }
            _ = &mut shutdown => break,
        }
    }

    drop(listener);
    graceful.shutdown().await;
    Ok(())
}
