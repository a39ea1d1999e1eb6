use binary_file_manager::load_config::{load_config, VAULT_ENV};
use binary_file_manager_core::settings::{ManagerSettings, DEFAULT_FILENAME_FORMAT};
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

fn config_file(yaml: &str) -> NamedTempFile {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), yaml).unwrap();
    config_file
}

/// A fully specified config maps every key onto the settings and retry policy.
#[tokio::test]
#[serial]
async fn test_load_config_success_all_sections() {
    env::remove_var(VAULT_ENV);
    let config_file = config_file(
        r#"
vault: ./my-vault
seen_list: ./state/files.json
plugins_dir: ./plugins
settings:
  binary_file_path: Inbox
  folder: Meta
  attachments_file_path: Files
  filename_format: "{{PATH}}"
  template_path: Templates/binary.md
  use_templater: true
  extensions: [png, pdf]
retry:
  attempts: 5
  interval_ms: 20
"#,
    );

    let config = load_config(config_file.path()).expect("Config should load");

    // Relative paths are anchored at the config file's folder.
    let base = config_file.path().parent().unwrap();
    assert_eq!(config.vault, base.join("./my-vault"));
    assert_eq!(config.seen_list_path(), base.join("./state/files.json"));
    assert_eq!(config.plugins_path(), base.join("./plugins"));
    assert_eq!(
        config.settings,
        ManagerSettings {
            binary_file_path: "Inbox".to_string(),
            folder: "Meta".to_string(),
            attachments_file_path: "Files".to_string(),
            filename_format: "{{PATH}}".to_string(),
            template_path: "Templates/binary.md".to_string(),
            use_templater: true,
            extensions: vec!["png".to_string(), "pdf".to_string()],
        }
    );
    let retry = config.retry_policy();
    assert_eq!(retry.attempts, 5);
    assert_eq!(retry.interval, Duration::from_millis(20));
}

/// Only `vault` is required; everything else falls back to defaults.
#[tokio::test]
#[serial]
async fn test_load_config_defaults_for_missing_sections() {
    env::remove_var(VAULT_ENV);
    let config_file = config_file("vault: /data/vault\nsettings:\n  binary_file_path: Inbox\n");

    let config = load_config(config_file.path()).expect("Config should load with defaults");

    assert_eq!(
        config.seen_list_path(),
        PathBuf::from("/data/vault/.binary-file-manager/files.json")
    );
    assert_eq!(
        config.plugins_path(),
        PathBuf::from("/data/vault/.obsidian/plugins")
    );
    assert_eq!(config.settings.binary_file_path, "Inbox");
    assert_eq!(config.settings.attachments_file_path, "Attachments");
    assert_eq!(config.settings.filename_format, DEFAULT_FILENAME_FORMAT);
    assert!(!config.settings.use_templater);
    assert!(config.settings.extensions.iter().any(|e| e == "png"));

    let retry = config.retry_policy();
    assert_eq!(retry.attempts, 1000);
    assert_eq!(retry.interval, Duration::from_millis(1000));
}

#[tokio::test]
#[serial]
async fn test_load_config_relative_vault_does_not_depend_on_working_directory() {
    env::remove_var(VAULT_ENV);
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("conf").join("bfm.yaml");
    std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
    write(&config_path, "vault: ../notes\n").unwrap();

    let config = load_config(&config_path).expect("Config should load");

    let expected_vault = dir.path().join("conf").join("../notes");
    assert_eq!(config.vault, expected_vault);
    assert_eq!(
        config.seen_list_path(),
        expected_vault.join(".binary-file-manager/files.json")
    );
    assert_eq!(
        config.plugins_path(),
        expected_vault.join(".obsidian/plugins")
    );
}

#[tokio::test]
#[serial]
async fn test_load_config_vault_overridden_by_env() {
    let config_file = config_file("vault: ./from-file\n");
    env::set_var(VAULT_ENV, "/from/env");

    let config = load_config(config_file.path());
    env::remove_var(VAULT_ENV);

    assert_eq!(config.expect("Config should load").vault, PathBuf::from("/from/env"));
}

#[tokio::test]
#[serial]
async fn test_load_config_errors_when_vault_missing() {
    env::remove_var(VAULT_ENV);
    let config_file = config_file("settings:\n  folder: Meta\n");

    let err = load_config(config_file.path()).unwrap_err();
    assert!(err.to_string().contains("vault"), "got: {err}");
}

/// This test ensures that if the config file is not valid YAML, load_config errors and reports as such.
#[tokio::test]
#[serial]
async fn test_load_config_errors_for_invalid_file() {
    let config_file = config_file("not-yaml: [:::");

    let err = load_config(config_file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[tokio::test]
#[serial]
async fn test_load_config_errors_for_missing_file() {
    let err = load_config("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
