//! Device report sent with the update request
//!
//! The server decides which directives to return from this snapshot of
//! identity, firmware versions and installed applications.

use crate::error::Result;
use crate::exec::CommandRunner;
use crate::inventory::PackageInventory;
use crate::props::PropertyReader;
use ota_common::AgentConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Request body, field names as the update server expects them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeviceReport {
    /// Android API level
    pub android: String,
    pub brand: String,
    #[serde(rename = "brandUiVersion", skip_serializing_if = "Option::is_none")]
    pub brand_ui_version: Option<String>,
    pub cota: String,
    pub fota: String,
    pub mboard: String,
    pub model: String,
    pub panel: String,
    pub serial: String,
    pub emac: String,
    pub wmac: String,
    #[serde(rename = "lpackageName")]
    pub launcher_package: String,
    #[serde(rename = "lversionName")]
    pub launcher_version_name: String,
    #[serde(rename = "lversionCode")]
    pub launcher_version_code: String,
    /// Installed package id to versionName
    pub apps: BTreeMap<String, String>,
}

/// Brand as read from the launcher UI config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brand {
    pub name: String,
    pub ui_version: Option<String>,
}

pub struct DeviceProbe<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a AgentConfig,
}

impl<'a> DeviceProbe<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a AgentConfig) -> Self {
        Self { runner, config }
    }

    pub fn collect(&self) -> Result<DeviceReport> {
        let props = PropertyReader::new(self.runner, &self.config.tools.getprop);
        let inventory = PackageInventory::new(self.runner, &self.config.tools);
        let device = &self.config.device;

        let brand = self.brand(&props)?;
        let launcher = &device.launcher_package;
        let (launcher_package, launcher_version_name, launcher_version_code) =
            if inventory.is_installed(launcher)? {
                let name = inventory.installed_version_name(launcher)?.unwrap_or_default();
                let code = inventory
                    .installed_version_code(launcher)
                    .map(|c| c.to_string())
                    .unwrap_or_default();
                (launcher.clone(), name, code)
            } else {
                debug!("launcher {} not installed", launcher);
                (String::new(), String::new(), String::new())
            };

        Ok(DeviceReport {
            android: props.get("ro.build.version.sdk")?,
            brand: brand.name,
            brand_ui_version: brand.ui_version,
            cota: props.first_of_or_empty(&self.config.ota.cota_keys)?,
            fota: props.first_of_or_empty(&self.config.ota.fota_keys)?,
            mboard: props.first_of_or_empty(&keys(&["ro.cvte.boardname", "ro.board.platform"]))?,
            model: props.get("ro.product.model")?,
            panel: props.get("ro.cvte.panelname")?,
            serial: props.get("ro.boot.serialno")?,
            emac: read_address(&device.ethernet_address_file),
            wmac: read_address(&device.wifi_address_file),
            launcher_package,
            launcher_version_name,
            launcher_version_code,
            apps: self.installed_apps(&inventory)?,
        })
    }

    fn brand(&self, props: &PropertyReader<'_>) -> Result<Brand> {
        for path in &self.config.device.ui_config_paths {
            if path.exists() {
                return read_ui_config(path);
            }
        }
        Ok(Brand {
            name: props.get("ro.product.brand")?,
            ui_version: None,
        })
    }

    fn installed_apps(&self, inventory: &PackageInventory<'_>) -> Result<BTreeMap<String, String>> {
        let mut apps = BTreeMap::new();
        for package in inventory.installed_packages()? {
            // A package can vanish between listing and dump
            let version = inventory
                .installed_version_name(&package)
                .ok()
                .flatten()
                .unwrap_or_default();
            apps.insert(package, version);
        }
        Ok(apps)
    }
}

/// Parse the launcher UI config for `brand` and `uiVersion`
pub fn read_ui_config(path: &Path) -> Result<Brand> {
    let content = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    Ok(Brand {
        name: json_field(&value, "brand").unwrap_or_default(),
        ui_version: json_field(&value, "uiVersion"),
    })
}

fn json_field(value: &serde_json::Value, key: &str) -> Option<String> {
    match value.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn read_address(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s.trim().to_string(),
        Err(e) => {
            warn!("Cannot read {}: {}", path.display(), e);
            String::new()
        }
    }
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
