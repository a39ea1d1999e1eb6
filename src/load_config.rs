/// `load_config` module: loads the YAML config of the CLI into a [`CliConfig`].
///
/// This is the only place where user-supplied YAML is parsed. The `settings`
/// and `retry` sections map straight onto the core crate's
/// [`ManagerSettings`] and [`RetrySection`]; every key inside them is optional
/// and falls back to the defaults of those types.
///
/// # Paths
/// Relative `vault`, `seen_list` and `plugins_dir` values are resolved against
/// the folder holding the config file, not the working directory. The
/// seen-list and plugin folder defaults live under the resolved vault.
///
/// # Environment
/// `BINARY_FILE_MANAGER_VAULT`, when set, replaces the `vault` key. Being an
/// environment value, a relative override stays relative to the working
/// directory.
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use binary_file_manager_core::retry::{RetryPolicy, RetrySection};
use binary_file_manager_core::settings::ManagerSettings;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const VAULT_ENV: &str = "BINARY_FILE_MANAGER_VAULT";

/// Seen-list location used when `seen_list` is not configured, relative to the vault.
pub const DEFAULT_SEEN_LIST: &str = ".binary-file-manager/files.json";

/// Plugin folder used when `plugins_dir` is not configured, relative to the vault.
pub const DEFAULT_PLUGINS_DIR: &str = ".obsidian/plugins";

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    pub vault: PathBuf,
    #[serde(default)]
    pub seen_list: Option<PathBuf>,
    #[serde(default)]
    pub plugins_dir: Option<PathBuf>,
    #[serde(default)]
    pub settings: ManagerSettings,
    #[serde(default)]
    pub retry: RetrySection,
}

impl CliConfig {
    pub fn seen_list_path(&self) -> PathBuf {
        self.seen_list
            .clone()
            .unwrap_or_else(|| self.vault.join(DEFAULT_SEEN_LIST))
    }

    pub fn plugins_path(&self) -> PathBuf {
        self.plugins_dir
            .clone()
            .unwrap_or_else(|| self.vault.join(DEFAULT_PLUGINS_DIR))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone().into()
    }
}

/// Loads a YAML config file and applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let base = path_ref.parent().unwrap_or_else(|| Path::new(""));
    config.vault = base.join(&config.vault);
    config.seen_list = config.seen_list.map(|p| base.join(p));
    config.plugins_dir = config.plugins_dir.map(|p| base.join(p));

    if let Ok(vault) = std::env::var(VAULT_ENV) {
        if !vault.trim().is_empty() {
            info!(env = VAULT_ENV, vault = %vault, "Vault overridden from environment");
            config.vault = PathBuf::from(vault);
        }
    }

    config.settings.trace_loaded();
    Ok(config)
}
