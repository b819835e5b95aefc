//! Fetch, verify, apply
//!
//! Shared by every directive that installs something. The checksum gate sits
//! between download and apply: a mismatch returns before any apply command
//! runs. The apply branch follows the kind the download was classified as,
//! which must agree with the kind the directive's action expects.

use crate::error::{OtaError, Result};
use crate::exec::CommandRunner;
use crate::fetcher::{ArtifactFetcher, ArtifactKind};
use crate::inventory::PackageInventory;
use crate::verifier::IntegrityVerifier;
use ota_common::{AgentConfig, UpdateDirective};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// What the apply step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Package installed and confirmed in the package listing
    PackageInstalled { package: String, artifact: PathBuf },
    /// Control file written and the reboot into recovery issued
    RecoveryScheduled { artifact: PathBuf },
}

pub struct ApplyPipeline<'a> {
    runner: &'a dyn CommandRunner,
    fetcher: &'a dyn ArtifactFetcher,
    config: &'a AgentConfig,
}

impl<'a> ApplyPipeline<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        fetcher: &'a dyn ArtifactFetcher,
        config: &'a AgentConfig,
    ) -> Self {
        Self {
            runner,
            fetcher,
            config,
        }
    }

    /// Download the directive's artifact, check it and apply it
    ///
    /// `expected` is the kind the directive's action can apply; an artifact
    /// classified otherwise is rejected before verification.
    pub fn run(&self, directive: &UpdateDirective, expected: ArtifactKind) -> Result<Applied> {
        let fetched = self.fetcher.fetch(&directive.download_url)?;

        if fetched.kind != expected {
            return Err(OtaError::ArtifactMismatch {
                url: directive.download_url.clone(),
                action: directive.action.to_string(),
                expected: expected.as_str(),
                actual: fetched.kind.as_str(),
            });
        }

        IntegrityVerifier::new(self.runner, &self.config.tools.checksum)
            .verify(&fetched.path, &directive.md5)?;

        match fetched.kind {
            ArtifactKind::Firmware => self.apply_firmware(fetched.path),
            ArtifactKind::Package => self.apply_package(fetched.path, &directive.package_name),
        }
    }

    fn apply_firmware(&self, artifact: PathBuf) -> Result<Applied> {
        let artifact = absolute(&artifact)?;
        write_recovery_command(&self.config.paths.recovery_command_file, &artifact)?;

        let tools = &self.config.tools;
        info!("Rebooting into {} to apply {}", tools.reboot_target, artifact.display());
        self.runner.run(&tools.reboot, &[tools.reboot_target.as_str()])?;

        Ok(Applied::RecoveryScheduled { artifact })
    }

    fn apply_package(&self, artifact: PathBuf, package: &str) -> Result<Applied> {
        let inventory = PackageInventory::new(self.runner, &self.config.tools);
        inventory.install(&artifact)?;

        if !inventory.is_installed(package)? {
            return Err(OtaError::InstallVerification {
                package: package.to_string(),
            });
        }

        info!("{} installed successfully", package);
        Ok(Applied::PackageInstalled {
            package: package.to_string(),
            artifact,
        })
    }
}

/// Contents of the recovery control file for `artifact`
pub fn recovery_command(artifact: &Path) -> String {
    format!("--update_package={}", artifact.display())
}

/// Write the recovery control file, creating its directory if needed
pub fn write_recovery_command(control_file: &Path, artifact: &Path) -> Result<()> {
    if let Some(parent) = control_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(control_file, recovery_command(artifact))?;
    info!("Wrote {}", control_file.display());
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
