//! Binary-level checks: argument parsing and the silent no-op paths.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tether() -> Command {
    let mut cmd = Command::cargo_bin("tether").unwrap();
    cmd.env("NO_COLOR", "1").env("CI", "true");
    cmd
}

#[test]
fn test_help_lists_commands() {
    tether()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve").and(predicate::str::contains("build")));
}

#[test]
fn test_serve_without_livereload_exits_cleanly() {
    let temp = TempDir::new().unwrap();
    tether()
        .args(["serve", "--platforms", "android,ios", "--project-root"])
        .arg(temp.path())
        .assert()
        .success();

    assert!(!temp.path().join("platforms").exists());
}

#[test]
fn test_serve_without_platforms_exits_cleanly() {
    let temp = TempDir::new().unwrap();
    tether()
        .args(["serve", "-l", "--project-root"])
        .arg(temp.path())
        .assert()
        .success();
}

#[test]
fn test_build_with_livereload_is_skipped() {
    let temp = TempDir::new().unwrap();
    tether()
        .args(["build", "-l", "--platforms", "browser", "--project-root"])
        .arg(temp.path())
        .assert()
        .success();

    assert!(!temp.path().join("www").exists());
}

#[test]
fn test_build_writes_out_dir() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("src")).unwrap();
    std::fs::write(temp.path().join("src/index.js"), "main();").unwrap();
    std::fs::write(temp.path().join("tether.config.toml"), "out_dir = \"dist\"\n").unwrap();

    tether()
        .args(["build", "--platforms", "android", "--project-root"])
        .arg(temp.path())
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(temp.path().join("dist/index.js")).unwrap(),
        "main();"
    );
}

#[test]
fn test_unknown_platform_is_rejected() {
    tether()
        .args(["serve", "-l", "--platforms", "windows"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("windows"));
}

#[test]
fn test_missing_config_file_fails_with_bail() {
    let temp = TempDir::new().unwrap();
    tether()
        .args(["build", "--bail", "--platforms", "ios", "--config", "nope.toml", "--project-root"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.toml"));
}

#[test]
fn test_missing_config_file_is_only_reported_without_bail() {
    let temp = TempDir::new().unwrap();
    tether()
        .args(["build", "--platforms", "ios", "--config", "nope.toml", "--project-root"])
        .arg(temp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("nope.toml"));

    assert!(!temp.path().join("www").exists());
}
