//! Integration tests for the dev-server lifecycle.
//!
//! Tests verify serving over a real socket, live reload after a file change,
//! the single-instance guard and that stop releases the port.

use std::fs;
use std::net::TcpListener;
use std::path::Path;

use axum::routing::get;
use serial_test::serial;
use tempfile::TempDir;
use tether_cli::config::{BundlerConfig, DevServerConfig, MiddlewareHook};
use tether_cli::dev::{
    AssetInjector, DevApp, DevServerLifecycle, LifecycleSettings, LifecycleState, Protocol,
    ServerAddress,
};
use tether_cli::{CliError, ServerError};
use tether_native::{Platform, TargetSet};
use tokio::time::{timeout, Duration};

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("src/index.js"), "console.log('v1');");
    write(&temp.path().join("www/index.html"), "<html>shell</html>");
    write(
        &temp.path().join("platforms/android/platform_www/cordova.js"),
        "// cordova android",
    );
    temp
}

fn settings(root: &Path, targets: &[Platform]) -> LifecycleSettings {
    LifecycleSettings {
        project_root: root.to_path_buf(),
        address: ServerAddress {
            protocol: Protocol::Http,
            host: "127.0.0.1".into(),
            port: 0,
        },
        targets: targets.iter().copied().collect::<TargetSet>(),
    }
}

async fn get_text(url: &str) -> (u16, String) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status().as_u16();
    (status, response.text().await.unwrap())
}

#[tokio::test]
#[serial(lifecycle)]
async fn test_serves_bundle_platform_www_and_static_files() {
    let temp = project();
    let config = AssetInjector::new().inject(BundlerConfig::default());
    let lifecycle = DevServerLifecycle::create(config, settings(temp.path(), &[Platform::Android])).unwrap();

    let addr = lifecycle.start().await.unwrap();
    let base = format!("http://{addr}");

    let (status, bundle) = get_text(&format!("{base}/index.js")).await;
    assert_eq!(status, 200);
    assert!(bundle.contains("console.log('v1');"));
    assert!(bundle.contains("/__tether_sse__"));

    let (_, cordova) = get_text(&format!("{base}/android/cordova.js")).await;
    assert_eq!(cordova, "// cordova android");

    let (_, shell) = get_text(&format!("{base}/some/route")).await;
    assert_eq!(shell, "<html>shell</html>");

    lifecycle.stop().await.unwrap();
}

#[tokio::test]
#[serial(lifecycle)]
async fn test_stop_releases_port_and_repeats_are_noops() {
    let temp = project();
    let lifecycle = DevServerLifecycle::create(BundlerConfig::default(), settings(temp.path(), &[])).unwrap();

    let addr = lifecycle.start().await.unwrap();
    assert!(TcpListener::bind(addr).is_err());

    lifecycle.stop().await.unwrap();
    assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    assert!(TcpListener::bind(addr).is_ok());

    lifecycle.stop().await.unwrap();
    lifecycle.stop().await.unwrap();
    assert_eq!(lifecycle.state(), LifecycleState::Stopped);
}

#[tokio::test]
#[serial(lifecycle)]
async fn test_only_one_lifecycle_at_a_time() {
    let temp = project();
    let first = DevServerLifecycle::create(BundlerConfig::default(), settings(temp.path(), &[])).unwrap();
    first.start().await.unwrap();

    let second = DevServerLifecycle::create(BundlerConfig::default(), settings(temp.path(), &[]));
    assert!(matches!(second, Err(CliError::Server(ServerError::AlreadyActive))));

    first.stop().await.unwrap();
    let third = DevServerLifecycle::create(BundlerConfig::default(), settings(temp.path(), &[])).unwrap();
    third.stop().await.unwrap();
}

#[tokio::test]
#[serial(lifecycle)]
async fn test_operator_hook_wins_over_platform_mount() {
    let temp = project();
    write(&temp.path().join("custom/cordova.js"), "// operator");
    let custom = temp.path().join("custom");

    let config = BundlerConfig {
        dev_server: Some(DevServerConfig {
            on_before_setup_middleware: Some(MiddlewareHook::new(move |app: &mut DevApp| {
                app.serve_dir("/android", &custom);
                app.route("/api/ping", get(|| async { "pong" }));
            })),
            ..Default::default()
        }),
        ..Default::default()
    };
    let lifecycle = DevServerLifecycle::create(config, settings(temp.path(), &[Platform::Android])).unwrap();
    let addr = lifecycle.start().await.unwrap();
    let base = format!("http://{addr}");

    let (_, cordova) = get_text(&format!("{base}/android/cordova.js")).await;
    assert_eq!(cordova, "// operator");
    let (_, pong) = get_text(&format!("{base}/api/ping")).await;
    assert_eq!(pong, "pong");

    lifecycle.stop().await.unwrap();
}

#[tokio::test]
#[serial(lifecycle)]
async fn test_file_change_pushes_build_completed() {
    let temp = project();
    let lifecycle = DevServerLifecycle::create(BundlerConfig::default(), settings(temp.path(), &[])).unwrap();
    let addr = lifecycle.start().await.unwrap();

    let mut events = reqwest::get(format!("http://{addr}/__tether_sse__")).await.unwrap();
    assert_eq!(events.status().as_u16(), 200);

    // Give the watcher a moment before touching the entry.
    tokio::time::sleep(Duration::from_millis(200)).await;
    write(&temp.path().join("src/index.js"), "console.log('v2');");

    let seen = timeout(Duration::from_secs(10), async {
        let mut received = String::new();
        while let Some(chunk) = events.chunk().await.unwrap() {
            received.push_str(&String::from_utf8_lossy(&chunk));
            if received.contains("BuildCompleted") {
                return received;
            }
        }
        received
    })
    .await
    .expect("no BuildCompleted event within 10s");
    assert!(seen.contains("BuildCompleted"));

    let (_, bundle) = get_text(&format!("http://{addr}/index.js")).await;
    assert!(bundle.contains("console.log('v2');"));

    lifecycle.stop().await.unwrap();
}
