//! Test doubles for the OS and network collaborators.

#![allow(dead_code)]

use ota_agent::fetcher::destination_for;
use ota_agent::{
    ArtifactFetcher, CommandResult, CommandRunner, FetchedArtifact, OtaError, Result,
};
use ota_common::{ActionKind, AgentConfig, PathsConfig, UpdateDirective};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use tempfile::TempDir;

pub const GOOD_MD5: &str = "0123456789abcdef0123456789abcdef";
pub const BAD_MD5: &str = "ffffffffffffffffffffffffffffffff";

/// Simulated device: package manager, properties, checksum and reboot tools
#[derive(Default)]
pub struct FakeDevice {
    pub installed: RefCell<BTreeMap<String, i64>>,
    pub props: HashMap<String, String>,
    /// Digest the checksum tool reports for any file
    pub digest: String,
    /// Package registered by the next `pm install`, with its version code
    pub installs_as: Option<(String, i64)>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self {
            digest: GOOD_MD5.to_string(),
            ..Default::default()
        }
    }

    pub fn with_package(self, name: &str, version_code: i64) -> Self {
        self.installed
            .borrow_mut()
            .insert(name.to_string(), version_code);
        self
    }

    pub fn with_prop(mut self, key: &str, value: &str) -> Self {
        self.props.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_digest(mut self, digest: &str) -> Self {
        self.digest = digest.to_string();
        self
    }

    pub fn installing(mut self, name: &str, version_code: i64) -> Self {
        self.installs_as = Some((name.to_string(), version_code));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls.borrow().iter().any(|c| c.starts_with(prefix))
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls.borrow().iter().position(|c| c.starts_with(prefix))
    }

    pub fn version_of(&self, name: &str) -> Option<i64> {
        self.installed.borrow().get(name).copied()
    }

    fn respond(&self, program: &str, args: &[&str]) -> CommandResult {
        let full = format!("{} {}", program, args.join(" "));
        match (program, args) {
            ("pm", ["list", "packages"]) => {
                let out: String = self
                    .installed
                    .borrow()
                    .keys()
                    .map(|p| format!("package:{}\n", p))
                    .collect();
                CommandResult::success(full, out)
            }
            ("pm", ["list", "packages", filter]) => {
                // Substring filter, like the real package manager
                let out: String = self
                    .installed
                    .borrow()
                    .keys()
                    .filter(|p| p.contains(filter))
                    .map(|p| format!("package:{}\n", p))
                    .collect();
                CommandResult::success(full, out)
            }
            ("pm", ["install", _path]) => {
                if let Some((name, code)) = &self.installs_as {
                    self.installed.borrow_mut().insert(name.clone(), *code);
                }
                CommandResult::success(full, "Success\n")
            }
            ("pm", ["uninstall", name]) => {
                if self.installed.borrow_mut().remove(*name).is_some() {
                    CommandResult::success(full, "Success\n")
                } else {
                    CommandResult::success(full, "Failure [DELETE_FAILED_INTERNAL_ERROR]\n")
                }
            }
            ("dumpsys", ["package", name]) => match self.version_of(name) {
                Some(code) => CommandResult::success(
                    full,
                    format!(
                        "  Package [{}]:\n    versionCode={} minSdk=21 targetSdk=28\n    versionName={}.0\n",
                        name, code, code
                    ),
                ),
                None => CommandResult::success(full, ""),
            },
            ("getprop", [key]) => {
                let value = self.props.get(*key).cloned().unwrap_or_default();
                CommandResult::success(full, format!("{}\n", value))
            }
            ("md5sum", [path]) => {
                CommandResult::success(full, format!("{}  {}\n", self.digest, path))
            }
            ("reboot", ["recovery"]) => CommandResult::success(full, ""),
            _ => CommandResult::failure(full, 127, "unexpected command"),
        }
    }
}

impl CommandRunner for FakeDevice {
    fn execute(&self, program: &str, args: &[&str]) -> CommandResult {
        let result = self.respond(program, args);
        self.calls.borrow_mut().push(result.full_command.clone());
        result
    }
}

/// Writes a placeholder file where the real fetcher would put the download
pub struct FakeFetcher {
    pub paths: PathsConfig,
    pub fetched: RefCell<Vec<String>>,
    pub fail: bool,
}

impl FakeFetcher {
    pub fn new(paths: PathsConfig) -> Self {
        Self {
            paths,
            fetched: RefCell::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing(paths: PathsConfig) -> Self {
        Self {
            fail: true,
            ..Self::new(paths)
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.borrow().len()
    }
}

impl ArtifactFetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedArtifact> {
        self.fetched.borrow_mut().push(url.to_string());
        if self.fail {
            return Err(OtaError::HttpStatus {
                status: 404,
                url: url.to_string(),
            });
        }
        let (dest, kind) = destination_for(&self.paths, url)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, b"artifact")?;
        Ok(FetchedArtifact { path: dest, kind })
    }
}

/// Config with every path inside a fresh temp dir
pub fn test_config() -> (TempDir, AgentConfig) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = AgentConfig {
        paths: PathsConfig::rooted_at(dir.path()),
        ..Default::default()
    };
    (dir, config)
}

pub fn package_directive(action: ActionKind, package: &str, version_code: i64) -> UpdateDirective {
    UpdateDirective {
        action,
        package_name: package.to_string(),
        version_code,
        md5: GOOD_MD5.to_string(),
        download_url: format!("http://updates.test/apps/{}-{}.apk", package, version_code),
        ..Default::default()
    }
}

pub fn ota_directive(action: ActionKind, build_date: &str) -> UpdateDirective {
    UpdateDirective {
        action,
        build_date: build_date.to_string(),
        md5: GOOD_MD5.to_string(),
        download_url: format!("http://updates.test/ota/{}/update.zip", build_date),
        ..Default::default()
    }
}
