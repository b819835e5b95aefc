//! Agent configuration
//!
//! Config file: --config PATH, $OTA_AGENT_CONFIG or /etc/ota-agent/config.toml.
//! Every section defaults, so an absent file or a partial file is fine.

use crate::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Update server endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Full URL of the update list
    pub url: String,

    /// Sent as the `Accept-Version` header
    pub api_version: String,

    /// Overall timeout of the update list request
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://192.168.1.9:9876/update.json".to_string(),
            api_version: "1.0.0".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Download and control file locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub package_dir: PathBuf,
    pub firmware_dir: PathBuf,
    pub recovery_command_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            package_dir: PathBuf::from(paths::DEFAULT_PACKAGE_DIR),
            firmware_dir: PathBuf::from(paths::DEFAULT_FIRMWARE_DIR),
            recovery_command_file: PathBuf::from(paths::DEFAULT_RECOVERY_COMMAND_FILE),
        }
    }
}

impl PathsConfig {
    /// Root every path at `root`, for tests and staging devices
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            package_dir: root.join("sdcard"),
            firmware_dir: root.join("cache"),
            recovery_command_file: root.join("cache/recovery/command"),
        }
    }
}

/// External programs invoked by the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// `list packages`, `install`, `uninstall`
    pub package_manager: String,
    /// `package <name>` metadata dump
    pub package_dump: String,
    pub getprop: String,
    /// Prints the hex digest first on its output line
    pub checksum: String,
    pub reboot: String,
    /// Argument passed to `reboot` to enter the apply mode
    pub reboot_target: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            package_manager: "pm".to_string(),
            package_dump: "dumpsys".to_string(),
            getprop: "getprop".to_string(),
            checksum: "md5sum".to_string(),
            reboot: "reboot".to_string(),
            reboot_target: "recovery".to_string(),
        }
    }
}

/// Property keys holding the local OTA versions, tried in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtaConfig {
    pub fota_keys: Vec<String>,
    pub cota_keys: Vec<String>,
}

impl Default for OtaConfig {
    fn default() -> Self {
        Self {
            fota_keys: vec![
                "ro.cvte.ota.version".to_string(),
                "ro.build.date.utc".to_string(),
            ],
            cota_keys: vec!["ro.cloudwalker.cota.version".to_string()],
        }
    }
}

/// Sources for the device report sent with the update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub launcher_package: String,
    pub ui_config_paths: Vec<PathBuf>,
    pub ethernet_address_file: PathBuf,
    pub wifi_address_file: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            launcher_package: "tv.cloudwalker.cwnxt.launcher.com".to_string(),
            ui_config_paths: paths::DEFAULT_UI_CONFIG_PATHS
                .iter()
                .map(PathBuf::from)
                .collect(),
            ethernet_address_file: PathBuf::from(paths::DEFAULT_ETHERNET_ADDRESS_FILE),
            wifi_address_file: PathBuf::from(paths::DEFAULT_WIFI_ADDRESS_FILE),
        }
    }
}

/// Batch failure policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BatchConfig {
    /// Keep processing later directives after a failure
    pub continue_on_error: bool,
}

/// Main agent configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub tools: ToolsConfig,
    pub ota: OtaConfig,
    pub device: DeviceConfig,
    pub batch: BatchConfig,
}

impl AgentConfig {
    /// Load from a specific file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load using the standard search path, falling back to defaults
    pub fn load(explicit: Option<PathBuf>) -> Result<Self> {
        match paths::config_search_path(explicit) {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                Self::load_from_path(&path)
            }
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Serialize to TOML, used to show the effective config
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
