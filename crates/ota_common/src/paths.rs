//! Default filesystem locations on the device

use std::path::PathBuf;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "OTA_AGENT_CONFIG";

/// System-wide config file
pub const SYSTEM_CONFIG_FILE: &str = "/etc/ota-agent/config.toml";

/// Downloaded application packages land here
pub const DEFAULT_PACKAGE_DIR: &str = "/sdcard";

/// Downloaded firmware images land here
pub const DEFAULT_FIRMWARE_DIR: &str = "/cache";

/// Control file read by recovery on the next boot
pub const DEFAULT_RECOVERY_COMMAND_FILE: &str = "/cache/recovery/command";

/// Launcher UI config, checked in order
pub const DEFAULT_UI_CONFIG_PATHS: &[&str] = &[
    "/system/etc/cloudwalker_assets/launcherUiConfig.json",
    "/vendor/etc/cloudwalker_assets/launcherUiConfig.json",
];

pub const DEFAULT_ETHERNET_ADDRESS_FILE: &str = "/sys/class/net/eth0/address";
pub const DEFAULT_WIFI_ADDRESS_FILE: &str = "/sys/class/net/wlan0/address";

/// Resolve the config file to read
///
/// Priority:
/// 1. explicit path (command line)
/// 2. $OTA_AGENT_CONFIG
/// 3. /etc/ota-agent/config.toml, when it exists
pub fn config_search_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let system = PathBuf::from(SYSTEM_CONFIG_FILE);
    if system.exists() {
        Some(system)
    } else {
        None
    }
}
