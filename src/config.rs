use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ReleaseError, Result};

const CONFIG_FILE_NAME: &str = "release-cycle.toml";

/// Represents the complete configuration for release-cycle.
///
/// Every section is optional; a missing file yields the defaults used by CI runs.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub github: GitHubConfig,
}

fn default_identity_name() -> String {
    "GitHub Action".to_string()
}

fn default_identity_email() -> String {
    "github-action@users.noreply.github.com".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

/// Author and committer identity used for generated commits.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IdentityConfig {
    #[serde(default = "default_identity_name")]
    pub name: String,

    #[serde(default = "default_identity_email")]
    pub email: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            name: default_identity_name(),
            email: default_identity_email(),
        }
    }
}

/// Hosting platform API settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitHubConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        GitHubConfig {
            api_base: default_api_base(),
        }
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| ReleaseError::config(format!("Invalid config: {}", e)))
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release-cycle.toml` in current directory
/// 3. `release-cycle.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        fs::read_to_string(CONFIG_FILE_NAME)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    parse_config(&config_str)
}
