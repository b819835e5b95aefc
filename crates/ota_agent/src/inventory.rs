//! Installed application packages
//!
//! Wraps the device package manager:
//! - `pm list packages [filter]` prints `package:<name>` lines
//! - `dumpsys package <name>` prints metadata including `versionCode=` and
//!   `versionName=`
//! - `pm install <path>` / `pm uninstall <name>` print `Success` on success

use crate::error::{OtaError, Result};
use crate::exec::CommandRunner;
use ota_common::{PackageState, ToolsConfig};
use std::path::Path;
use tracing::{debug, info};

pub struct PackageInventory<'a> {
    runner: &'a dyn CommandRunner,
    tools: &'a ToolsConfig,
}

impl<'a> PackageInventory<'a> {
    pub fn new(runner: &'a dyn CommandRunner, tools: &'a ToolsConfig) -> Self {
        Self { runner, tools }
    }

    /// Every installed package id
    pub fn installed_packages(&self) -> Result<Vec<String>> {
        let out = self
            .runner
            .run(&self.tools.package_manager, &["list", "packages"])?;
        Ok(parse_package_list(&out))
    }

    /// Whether exactly `package` is installed
    pub fn is_installed(&self, package: &str) -> Result<bool> {
        let out = self
            .runner
            .run(&self.tools.package_manager, &["list", "packages", package])?;
        Ok(parse_package_list(&out).iter().any(|p| p == package))
    }

    /// Installed version code of `package`
    pub fn installed_version_code(&self, package: &str) -> Result<i64> {
        let out = self.dump(package)?;
        parse_version_code(&out).ok_or_else(|| OtaError::VersionParse {
            source_name: format!("{} package {}", self.tools.package_dump, package),
            raw: first_line_containing(&out, "versionCode"),
        })
    }

    /// Installed version name of `package`, if the dump reports one
    pub fn installed_version_name(&self, package: &str) -> Result<Option<String>> {
        let out = self.dump(package)?;
        Ok(parse_version_name(&out))
    }

    /// Presence and version in one step
    pub fn state(&self, package: &str) -> Result<PackageState> {
        if !self.is_installed(package)? {
            debug!("{} is not installed", package);
            return Ok(PackageState::NotInstalled);
        }
        let version_code = self.installed_version_code(package)?;
        debug!("{} installed at versionCode {}", package, version_code);
        Ok(PackageState::Installed { version_code })
    }

    /// Install an application package file
    pub fn install(&self, artifact: &Path) -> Result<()> {
        let path = artifact.to_string_lossy().into_owned();
        self.runner
            .run(&self.tools.package_manager, &["install", path.as_str()])?;
        Ok(())
    }

    /// Remove a package; the package manager must report `Success`
    pub fn uninstall(&self, package: &str) -> Result<()> {
        let out = self
            .runner
            .run(&self.tools.package_manager, &["uninstall", package])?;
        if !out.contains("Success") {
            return Err(OtaError::UninstallFailed {
                package: package.to_string(),
                output: out.trim().to_string(),
            });
        }
        info!("{} uninstalled successfully", package);
        Ok(())
    }

    fn dump(&self, package: &str) -> Result<String> {
        self.runner
            .run(&self.tools.package_dump, &["package", package])
    }
}

/// Package ids from `package:<name>` lines
pub fn parse_package_list(output: &str) -> Vec<String> {
    output
        .split("package:")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// First `versionCode=<n>` token in a package dump
///
/// Dumps print `versionCode=42 minSdk=21 targetSdk=28`; only the digits
/// directly after `=` are read.
pub fn parse_version_code(dump: &str) -> Option<i64> {
    dump.split_whitespace()
        .find_map(|token| token.strip_prefix("versionCode="))
        .and_then(|value| {
            let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        })
}

/// First `versionName=<s>` value in a package dump
pub fn parse_version_name(dump: &str) -> Option<String> {
    dump.lines()
        .filter_map(|line| line.trim().strip_prefix("versionName="))
        .map(|v| v.trim().to_string())
        .next()
}

fn first_line_containing(text: &str, needle: &str) -> String {
    text.lines()
        .find(|l| l.contains(needle))
        .unwrap_or_default()
        .trim()
        .to_string()
}
