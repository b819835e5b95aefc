//! Artifact downloads
//!
//! The URL's last path segment is classified once. A `.zip` file is a
//! firmware image, otherwise a name containing `apk` is an application
//! package, and anything else is firmware. The kind picks the destination
//! directory here and the apply branch later.

use crate::error::{OtaError, Result};
use ota_common::PathsConfig;
use reqwest::Url;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Marker in a file name identifying an application package
const PACKAGE_MARKER: &str = "apk";

/// Extension of recovery-applied images
const FIRMWARE_EXTENSION: &str = "zip";

/// What kind of file an artifact is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Application package, applied with the package manager
    Package,
    /// Firmware/OTA image, applied by recovery
    Firmware,
}

impl ArtifactKind {
    /// Classify by file name; the extension wins over the marker
    pub fn from_file_name(name: &str) -> Self {
        let extension = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        if extension.as_deref() == Some(FIRMWARE_EXTENSION) {
            Self::Firmware
        } else if name.contains(PACKAGE_MARKER) {
            Self::Package
        } else {
            Self::Firmware
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Firmware => "firmware",
        }
    }
}

/// A downloaded file and the kind it was classified as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

/// Retrieves remote artifacts to local files
pub trait ArtifactFetcher {
    /// Download `url` to its destination for [`destination_for`]
    fn fetch(&self, url: &str) -> Result<FetchedArtifact>;
}

/// Last non-empty path segment of `url`
pub fn file_name_from_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| OtaError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    parsed
        .path_segments()
        .and_then(|mut segments| segments.rfind(|name| !name.is_empty()))
        .map(|name| name.to_string())
        .ok_or_else(|| OtaError::InvalidUrl {
            url: url.to_string(),
            reason: "no file name in path".to_string(),
        })
}

/// Local destination for `url`, and the kind it was classified as
pub fn destination_for(paths: &PathsConfig, url: &str) -> Result<(PathBuf, ArtifactKind)> {
    let name = file_name_from_url(url)?;
    let kind = ArtifactKind::from_file_name(&name);
    let dir = match kind {
        ArtifactKind::Package => &paths.package_dir,
        ArtifactKind::Firmware => &paths.firmware_dir,
    };
    Ok((dir.join(name), kind))
}

/// Streams artifacts over HTTP straight to disk
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    paths: PathsConfig,
}

impl HttpFetcher {
    pub fn new(paths: PathsConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("ota-agent/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            // Firmware images are large; no overall deadline on the body
            .timeout(None)
            .build()?;
        Ok(Self { client, paths })
    }
}

impl ArtifactFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedArtifact> {
        let (dest, kind) = destination_for(&self.paths, url)?;
        info!("Downloading {} {} to {}", kind.as_str(), url, dest.display());

        let mut response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(OtaError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&dest)?);
        let written = response.copy_to(&mut writer)?;
        writer.flush()?;

        info!("Downloaded {} bytes to {}", written, dest.display());
        Ok(FetchedArtifact { path: dest, kind })
    }
}
