//! Serve command implementation.
//!
//! Orchestrates one live-reload run:
//! 1. Load configuration
//! 2. Negotiate a port and resolve the URLs devices will use
//! 3. Inject the webview scripts into the compiler config
//! 4. Create and start the dev server
//! 5. Point every target platform at it
//! 6. Wait for Ctrl+C or SIGTERM, then stop

use std::net::SocketAddr;

use crate::cli::ServeArgs;
use crate::config::{ConfigProvider, DevServerOverrides, FileConfigProvider};
use crate::dev::{
    resolve, AssetInjector, DevServerLifecycle, FallbackPolicy, LifecycleSettings,
    PlatformConfigWriter, PlatformReport, PortNegotiator, ResolvedUrls, ServerAddress,
    SignalAdapter,
};
use crate::error::Result;
use crate::ui;

/// Execute the serve command.
///
/// # Errors
///
/// Configuration errors, port negotiation failures, start failures and
/// descriptor write failures. A declined port fallback is not an error.
pub async fn execute(args: ServeArgs) -> Result<()> {
    let provider = FileConfigProvider::new(&args.project.project_root)
        .with_config_path(args.project.config.clone())
        .with_overrides(overrides(&args));
    run(&args, &provider, SignalAdapter::install()).await
}

/// Dev-server values given on the command line.
pub fn overrides(args: &ServeArgs) -> DevServerOverrides {
    DevServerOverrides {
        host: args.host.clone(),
        port: args.port,
        https: args.https.then_some(true),
    }
}

/// Run with an injected configuration source and shutdown signal.
///
/// Returns once the server has fully stopped, or immediately when there is
/// nothing to do.
pub async fn run(args: &ServeArgs, provider: &dyn ConfigProvider, signal: SignalAdapter) -> Result<()> {
    if !args.project.livereload {
        tracing::debug!("live reload not requested; not starting the dev server");
        return Ok(());
    }
    let targets = args.project.targets();
    if targets.is_empty() {
        tracing::debug!("no platforms requested; not starting the dev server");
        return Ok(());
    }

    let config = provider.load()?;
    let dev_config = config.dev_server();
    let host = dev_config.host().to_string();

    let policy = args
        .port_fallback
        .map(FallbackPolicy::from)
        .unwrap_or_else(FallbackPolicy::detect);
    let Some(port) = PortNegotiator::new(policy)
        .negotiate(&host, dev_config.port())
        .await?
    else {
        return Ok(());
    };

    let address = ServerAddress {
        protocol: dev_config.protocol(),
        host,
        port,
    };
    let urls = resolve(&address);
    let config = AssetInjector::new().inject(config);

    let root = args.project.project_root.clone();
    let lifecycle = DevServerLifecycle::create(
        config,
        LifecycleSettings {
            project_root: root.clone(),
            address,
            targets: targets.clone(),
        },
    )?;

    ui::info(&format!("Starting development server for {targets}..."));
    let local_addr = lifecycle.start().await?;

    let reports = match PlatformConfigWriter::new(&root).apply(&targets, &urls).await {
        Ok(reports) => reports,
        Err(err) => {
            if let Err(stop_err) = lifecycle.stop().await {
                tracing::warn!(error = %stop_err, "dev server did not stop cleanly");
            }
            return Err(err);
        }
    };

    print_banner(&urls, local_addr, &reports);

    signal.wait().await;
    ui::info("Shutting down development server...");
    lifecycle.stop().await?;
    ui::success("Development server stopped");
    Ok(())
}

fn print_banner(urls: &ResolvedUrls, local_addr: SocketAddr, reports: &[PlatformReport]) {
    ui::success("Development server running");
    ui::url_line("Local", &urls.local_url_for_terminal);
    if let Some(lan) = &urls.lan_url_for_terminal {
        ui::url_line("On your network", lan);
    }
    tracing::debug!(%local_addr, "serving");

    for report in reports {
        match report.files.len() {
            0 => ui::info(&format!("{}: no config.xml found, nothing to rewire", report.platform)),
            n => ui::info(&format!("{}: {} file(s) now load from the dev server", report.platform, n)),
        }
    }
    ui::info("Press Ctrl+C to stop");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{PlatformArg, ProjectArgs};
    use crate::config::{BundlerConfig, StaticConfigProvider};
    use std::path::Path;
    use tempfile::TempDir;

    fn args(root: &Path, platforms: Vec<PlatformArg>, livereload: bool) -> ServeArgs {
        ServeArgs {
            project: ProjectArgs {
                platforms,
                project_root: root.to_path_buf(),
                config: None,
                livereload,
            },
            host: None,
            port: None,
            https: false,
            port_fallback: None,
        }
    }

    #[test]
    fn test_overrides_only_carry_given_flags() {
        let temp = TempDir::new().unwrap();
        let mut serve = args(temp.path(), vec![], true);
        assert!(overrides(&serve).is_empty());

        serve.port = Some(9000);
        serve.https = true;
        let overrides = overrides(&serve);
        assert_eq!(overrides.port, Some(9000));
        assert_eq!(overrides.https, Some(true));
        assert!(overrides.host.is_none());
    }

    #[tokio::test]
    async fn test_without_livereload_nothing_happens() {
        let temp = TempDir::new().unwrap();
        // Loading this config would fail if it were consulted.
        let provider = StaticConfigProvider::new(BundlerConfig {
            entry: vec!["missing.js".into()],
            ..Default::default()
        });

        run(&args(temp.path(), vec![PlatformArg::Browser], false), &provider, SignalAdapter::manual())
            .await
            .unwrap();
        assert!(!temp.path().join("platforms").exists());
    }

    #[tokio::test]
    async fn test_empty_targets_nothing_happens() {
        let temp = TempDir::new().unwrap();
        let provider = StaticConfigProvider::default();

        run(&args(temp.path(), vec![], true), &provider, SignalAdapter::manual())
            .await
            .unwrap();
        assert!(!temp.path().join("platforms").exists());
    }
}
