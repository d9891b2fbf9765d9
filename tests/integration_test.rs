// tests/integration_test.rs
use std::process::Command;

use git2::Repository;
use tempfile::TempDir;

fn release_cycle(dir: &TempDir) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_release-cycle"));
    command
        .current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path())
        .env_remove("INPUT_ACTION")
        .env_remove("INPUT_VERSION-FILE")
        .env_remove("INPUT_REPO-TOKEN")
        .env_remove("GITHUB_ACTIONS");
    command
}

#[test]
fn test_release_cycle_help() {
    let dir = TempDir::new().expect("Could not create temp dir");
    let output = release_cycle(&dir)
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("--action"));
    assert!(stdout.contains("--version-file"));
    assert!(stdout.contains("--repo-token"));
}

#[test]
fn test_missing_inputs_are_rejected() {
    let dir = TempDir::new().expect("Could not create temp dir");
    let output = release_cycle(&dir)
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_inputs_read_from_action_environment() {
    let dir = TempDir::new().expect("Could not create temp dir");
    Repository::init(dir.path()).expect("Could not init git repo");

    let output = release_cycle(&dir)
        .env("INPUT_ACTION", "publish")
        .env("INPUT_VERSION-FILE", "package.json")
        .env("INPUT_REPO-TOKEN", "secret-token")
        .env("GITHUB_ACTIONS", "true")
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stdout.contains("::error::Unknown action: publish"), "stdout: {}", stdout);
    assert!(stderr.contains("Unknown action: publish"), "stderr: {}", stderr);
    assert!(!stdout.contains("secret-token"));
    assert!(!stderr.contains("secret-token"));
}

#[test]
fn test_outside_repository_fails() {
    let dir = TempDir::new().expect("Could not create temp dir");
    let output = release_cycle(&dir)
        .args(["--action", "prerelease", "--version-file", "package.json"])
        .args(["--repo-token", "secret-token"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Not inside a git repository"), "stderr: {}", stderr);
}
