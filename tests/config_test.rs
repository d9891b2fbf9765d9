// tests/config_test.rs
use release_cycle::config::{load_config, Config};
use release_cycle::ReleaseError;
use serial_test::serial;
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_load_from_explicit_path() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
[identity]
name = "release-bot"
email = "release-bot@example.com"

[github]
api_base = "https://ghe.example.com/api/v3"
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(Some(temp_file.path())).unwrap();
    assert_eq!(config.identity.name, "release-bot");
    assert_eq!(config.identity.email, "release-bot@example.com");
    assert_eq!(config.github.api_base, "https://ghe.example.com/api/v3");
}

#[test]
fn test_missing_explicit_path_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ReleaseError::Io(_)));
}

#[test]
fn test_empty_file_yields_defaults() {
    let temp_file = NamedTempFile::new().unwrap();
    let config = load_config(Some(temp_file.path())).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn test_loads_file_from_current_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("release-cycle.toml"),
        "[identity]\nemail = \"ci@example.com\"\n",
    )
    .unwrap();

    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    let loaded = load_config(None);
    std::env::set_current_dir(previous).unwrap();

    let config = loaded.unwrap();
    assert_eq!(config.identity.email, "ci@example.com");
    assert_eq!(config.identity.name, "GitHub Action");
}
