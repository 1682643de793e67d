use crate::config::*;
use crate::dev::Protocol;
use crate::error::{CliError, ConfigError};
use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

#[test]
#[serial(tether_env)]
fn test_defaults_without_file() {
    let temp = TempDir::new().unwrap();
    let config = FileConfigProvider::new(temp.path()).load().unwrap();

    assert_eq!(config.entry, vec![PathBuf::from("src/index.js")]);
    assert_eq!(config.out_dir, PathBuf::from("www"));
    assert!(config.dev_server.is_none());
    assert!(config.plugins.is_empty());

    let dev = config.dev_server();
    assert_eq!(dev.host(), "0.0.0.0");
    assert_eq!(dev.port(), 8080);
    assert_eq!(dev.protocol(), Protocol::Http);
    assert!(dev.hot());
    assert!(dev.history_api_fallback());
    assert_eq!(dev.static_dir(Path::new("/app")), PathBuf::from("/app/www"));
}

#[test]
#[serial(tether_env)]
fn test_toml_file_is_found_upward() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "tether.config.toml",
        r#"
entry = ["app/main.js"]

[dev_server]
https = true
port = 9100
hot = false
"#,
    );
    let nested = temp.path().join("apps/mobile");
    fs::create_dir_all(&nested).unwrap();

    let config = FileConfigProvider::new(&nested).load().unwrap();
    assert_eq!(config.entry, vec![PathBuf::from("app/main.js")]);

    let dev = config.dev_server();
    assert_eq!(dev.protocol(), Protocol::Https);
    assert_eq!(dev.port(), 9100);
    assert!(!dev.hot());
    assert!(dev.history_api_fallback());
}

#[test]
#[serial(tether_env)]
fn test_toml_wins_over_json_in_same_directory() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "tether.config.toml", "out_dir = \"from-toml\"\n");
    write(temp.path(), "tether.config.json", r#"{ "out_dir": "from-json" }"#);

    let provider = FileConfigProvider::new(temp.path());
    assert!(provider.config_path().unwrap().unwrap().ends_with("tether.config.toml"));
    assert_eq!(provider.load().unwrap().out_dir, PathBuf::from("from-toml"));
}

#[test]
#[serial(tether_env)]
fn test_explicit_json_path_relative_to_root() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "conf/dev.json",
        r#"{ "dev_server": { "host": "localhost", "static_dir": "public" } }"#,
    );

    let config = FileConfigProvider::new(temp.path())
        .with_config_path(Some(PathBuf::from("conf/dev.json")))
        .load()
        .unwrap();

    let dev = config.dev_server();
    assert_eq!(dev.host(), "0.0.0.0");
    assert_eq!(dev.static_dir(temp.path()), temp.path().join("public"));
}

#[test]
#[serial(tether_env)]
fn test_explicit_missing_path_is_not_found() {
    let temp = TempDir::new().unwrap();
    let err = FileConfigProvider::new(temp.path())
        .with_config_path(Some(PathBuf::from("nope.toml")))
        .load()
        .unwrap_err();
    assert!(matches!(err, CliError::Config(ConfigError::NotFound(_))));
}

#[test]
#[serial(tether_env)]
fn test_invalid_field_type_is_reported() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "tether.config.toml",
        "[dev_server]\nport = \"eighty\"\n",
    );
    let err = FileConfigProvider::new(temp.path()).load().unwrap_err();
    assert!(matches!(
        err,
        CliError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[test]
#[serial(tether_env)]
fn test_empty_entry_list_is_rejected() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "tether.config.json", r#"{ "entry": [] }"#);
    let err = FileConfigProvider::new(temp.path()).load().unwrap_err();
    assert!(matches!(
        err,
        CliError::Config(ConfigError::MissingField { ref field, .. }) if field == "entry"
    ));
}

#[test]
#[serial(tether_env)]
fn test_env_and_cli_precedence() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "tether.config.toml",
        "[dev_server]\nport = 9000\nhost = \"127.0.0.1\"\n",
    );

    unsafe { std::env::set_var("TETHER_DEV_SERVER__PORT", "9001") };
    let from_env = FileConfigProvider::new(temp.path()).load();
    let from_cli = FileConfigProvider::new(temp.path())
        .with_overrides(DevServerOverrides {
            port: Some(9002),
            https: Some(true),
            ..Default::default()
        })
        .load();
    unsafe { std::env::remove_var("TETHER_DEV_SERVER__PORT") };

    let env_dev = from_env.unwrap().dev_server();
    assert_eq!(env_dev.port(), 9001);
    assert_eq!(env_dev.host(), "127.0.0.1");

    let cli_dev = from_cli.unwrap().dev_server();
    assert_eq!(cli_dev.port(), 9002);
    assert_eq!(cli_dev.host(), "127.0.0.1");
    assert_eq!(cli_dev.protocol(), Protocol::Https);
}

#[test]
fn test_static_provider_keeps_programmatic_fields() {
    #[derive(Debug)]
    struct Banner;
    impl BundlePlugin for Banner {
        fn name(&self) -> &str {
            "banner"
        }
        fn prologue(&self) -> std::io::Result<Option<String>> {
            Ok(Some("/* banner */".into()))
        }
    }

    let config = BundlerConfig {
        plugins: vec![std::sync::Arc::new(Banner)],
        dev_server: Some(DevServerConfig {
            on_before_setup_middleware: Some(MiddlewareHook::new(|_| {})),
            ..Default::default()
        }),
        ..Default::default()
    };

    let loaded = StaticConfigProvider::new(config).load().unwrap();
    assert_eq!(loaded.plugins.len(), 1);
    assert_eq!(loaded.plugins[0].name(), "banner");
    assert!(loaded.dev_server().on_before_setup_middleware.is_some());
}
