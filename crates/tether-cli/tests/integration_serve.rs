//! End-to-end runs of `serve` against real project trees.
//!
//! The shutdown signal is fired before each run starts, so every run goes
//! all the way through start, platform rewiring and stop, then returns.

use std::fs;
use std::net::TcpListener;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serial_test::serial;
use tempfile::TempDir;
use tether_cli::cli::{FallbackArg, PlatformArg, ProjectArgs, ServeArgs};
use tether_cli::commands::serve;
use tether_cli::config::{BundlerConfig, DevServerConfig, MiddlewareHook, StaticConfigProvider};
use tether_cli::dev::SignalAdapter;
use tether_cli::{CliError, ServerError};

const DESCRIPTOR: &str = r#"<?xml version='1.0' encoding='utf-8'?>
<widget id="io.example.app" version="1.0.0" xmlns="http://www.w3.org/ns/widgets">
    <name>Example</name>
    <content src="index.html" />
    <content src="stale.html" />
</widget>
"#;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("src/index.js"), "console.log('app');");
    write(&temp.path().join("www/index.html"), "<html></html>");
    temp
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn args(root: &Path, platforms: Vec<PlatformArg>) -> ServeArgs {
    ServeArgs {
        project: ProjectArgs {
            platforms,
            project_root: root.to_path_buf(),
            config: None,
            livereload: true,
        },
        host: None,
        port: None,
        https: false,
        port_fallback: Some(FallbackArg::Accept),
    }
}

fn provider(host: &str, port: u16) -> StaticConfigProvider {
    StaticConfigProvider::new(BundlerConfig {
        dev_server: Some(DevServerConfig {
            host: Some(host.to_string()),
            port: Some(port),
            ..Default::default()
        }),
        ..Default::default()
    })
}

fn fired() -> SignalAdapter {
    let signal = SignalAdapter::manual();
    signal.trigger();
    signal
}

#[tokio::test]
#[serial(lifecycle)]
async fn test_browser_gets_redirect_page() {
    let temp = project();
    let port = free_port();

    serve::run(
        &args(temp.path(), vec![PlatformArg::Browser]),
        &provider("0.0.0.0", port),
        fired(),
    )
    .await
    .unwrap();

    let page = fs::read_to_string(temp.path().join("platforms/browser/www/index.html")).unwrap();
    assert!(page.contains(&format!("URL=http://localhost:{port}/")));
}

#[tokio::test]
#[serial(lifecycle)]
async fn test_devices_use_fallback_hosts_without_lan() {
    let temp = project();
    let android_a = temp.path().join("platforms/android/app/src/main/res/xml/config.xml");
    let android_b = temp.path().join("platforms/android/config.xml");
    let ios = temp.path().join("platforms/ios/Example/config.xml");
    for path in [&android_a, &android_b, &ios] {
        write(path, DESCRIPTOR);
    }
    let port = free_port();

    serve::run(
        &args(temp.path(), vec![PlatformArg::Android, PlatformArg::Ios]),
        &provider("127.0.0.1", port),
        fired(),
    )
    .await
    .unwrap();

    for path in [&android_a, &android_b] {
        let xml = fs::read_to_string(path).unwrap();
        assert_eq!(xml.matches("<content ").count(), 1, "{}", path.display());
        assert!(xml.contains(&format!(r#"<content src="http://10.0.2.2:{port}" />"#)));
        assert!(!xml.contains("allow-navigation"));
        assert!(xml.contains("<name>Example</name>"));
    }

    let xml = fs::read_to_string(&ios).unwrap();
    assert_eq!(xml.matches("<content ").count(), 1);
    assert!(xml.contains(&format!(r#"<content src="http://localhost:{port}" />"#)));
    assert_eq!(xml.matches(r#"<allow-navigation href="*" />"#).count(), 1);
}

#[tokio::test]
#[serial(lifecycle)]
async fn test_second_run_leaves_descriptors_byte_identical() {
    let temp = project();
    let ios = temp.path().join("platforms/ios/config.xml");
    write(&ios, DESCRIPTOR);
    let port = free_port();

    let serve_args = args(temp.path(), vec![PlatformArg::Ios]);
    serve::run(&serve_args, &provider("127.0.0.1", port), fired())
        .await
        .unwrap();
    let first = fs::read(&ios).unwrap();

    serve::run(&serve_args, &provider("127.0.0.1", port), fired())
        .await
        .unwrap();
    assert_eq!(fs::read(&ios).unwrap(), first);
}

#[tokio::test]
#[serial(lifecycle)]
async fn test_declined_fallback_has_no_side_effects() {
    let temp = project();
    write(&temp.path().join("platforms/android/config.xml"), DESCRIPTOR);
    let held = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = held.local_addr().unwrap().port();

    let mut serve_args = args(temp.path(), vec![PlatformArg::Android, PlatformArg::Browser]);
    serve_args.port_fallback = Some(FallbackArg::Decline);

    serve::run(&serve_args, &provider("127.0.0.1", port), SignalAdapter::manual())
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(temp.path().join("platforms/android/config.xml")).unwrap(),
        DESCRIPTOR
    );
    assert!(!temp.path().join("platforms/browser").exists());
}

#[tokio::test]
#[serial(lifecycle)]
async fn test_bind_race_writes_no_descriptors() {
    let temp = project();
    let descriptor = temp.path().join("platforms/android/config.xml");
    write(&descriptor, DESCRIPTOR);
    let port = free_port();

    // Take the port between negotiation and bind.
    let stolen = Arc::new(Mutex::new(Vec::new()));
    let thief = stolen.clone();
    let provider = StaticConfigProvider::new(BundlerConfig {
        dev_server: Some(DevServerConfig {
            host: Some("127.0.0.1".into()),
            port: Some(port),
            on_before_setup_middleware: Some(MiddlewareHook::new(move |_app| {
                let listener = TcpListener::bind(("127.0.0.1", port)).unwrap();
                thief.lock().unwrap().push(listener);
            })),
            ..Default::default()
        }),
        ..Default::default()
    });

    let err = serve::run(&args(temp.path(), vec![PlatformArg::Android]), &provider, fired())
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::Server(ServerError::BindFailed { .. })));
    assert_eq!(fs::read_to_string(&descriptor).unwrap(), DESCRIPTOR);
    assert_eq!(stolen.lock().unwrap().len(), 1);
}

#[tokio::test]
#[serial(lifecycle)]
async fn test_malformed_descriptor_stops_server_then_fails() {
    let temp = project();
    write(&temp.path().join("platforms/android/config.xml"), "<widget>");
    let port = free_port();

    let err = serve::run(
        &args(temp.path(), vec![PlatformArg::Android]),
        &provider("127.0.0.1", port),
        SignalAdapter::manual(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CliError::Native(_)));
    // The server was stopped before the error surfaced.
    assert!(TcpListener::bind(("127.0.0.1", port)).is_ok());
}
