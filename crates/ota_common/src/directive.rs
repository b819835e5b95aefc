//! Update directives as issued by the update server
//!
//! One directive per element of the server's JSON array. Directives are
//! read-only once decoded; the agent never rewrites a field.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Action requested by a directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Install,
    Upgrade,
    Uninstall,
    Downgrade,
    /// Firmware image update
    Fota,
    /// Customisation/content image update
    Cota,
    /// Anything the agent does not know about; ignored without error
    #[default]
    #[serde(other)]
    Unknown,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Upgrade => "upgrade",
            Self::Uninstall => "uninstall",
            Self::Downgrade => "downgrade",
            Self::Fota => "fota",
            Self::Cota => "cota",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the action targets an application package
    pub fn is_package_action(&self) -> bool {
        matches!(
            self,
            Self::Install | Self::Upgrade | Self::Uninstall | Self::Downgrade
        )
    }

    /// Whether the action targets a firmware/OTA image
    pub fn is_ota_action(&self) -> bool {
        matches!(self, Self::Fota | Self::Cota)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single server-issued update instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateDirective {
    pub action: ActionKind,

    /// Target version code for package actions
    pub version_code: i64,

    /// Target application id for package actions
    pub package_name: String,

    /// Target build stamp for OTA actions, digits optionally split by `_`
    pub build_date: String,

    /// Expected 32 character lowercase hex digest of the artifact
    pub md5: String,

    pub size: String,

    #[serde(alias = "downloadURL")]
    pub download_url: String,

    pub update_change_log: String,

    /// Accepted from the server but not consulted by reconciliation
    pub is_forced: bool,
}

impl UpdateDirective {
    /// Short label for log lines
    pub fn label(&self) -> String {
        if self.action.is_ota_action() {
            format!("{} {}", self.action, self.build_date)
        } else if self.package_name.is_empty() {
            self.action.to_string()
        } else {
            format!("{} {}@{}", self.action, self.package_name, self.version_code)
        }
    }
}

/// Decode the server's response body into directives, in server order
pub fn parse_directives(body: &str) -> serde_json::Result<Vec<UpdateDirective>> {
    serde_json::from_str(body)
}
