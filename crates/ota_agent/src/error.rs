//! Error types for the update agent.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OtaError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Malformed server response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid {name} header value: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Failed to start `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("None of the properties {keys:?} is set")]
    PropertyUnset { keys: Vec<String> },

    #[error("Cannot read version from {source_name}: {raw:?}")]
    VersionParse { source_name: String, raw: String },

    #[error("Checksum tool printed no digest for {}", .path.display())]
    ChecksumOutput { path: PathBuf },

    #[error("MD5 not matched: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("{url} is a {actual} artifact, {action} needs a {expected} artifact")]
    ArtifactMismatch {
        url: String,
        action: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{package} not installed after install command")]
    InstallVerification { package: String },

    #[error("Unable to uninstall {package}: {output}")]
    UninstallFailed { package: String, output: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OtaError {
    /// Taxonomy label used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            OtaError::Transport(_)
            | OtaError::HttpStatus { .. }
            | OtaError::InvalidUrl { .. }
            | OtaError::InvalidHeader { .. } => "transport",
            OtaError::Decode(_) => "decode",
            OtaError::CommandSpawn { .. }
            | OtaError::CommandFailed { .. }
            | OtaError::PropertyUnset { .. }
            | OtaError::VersionParse { .. }
            | OtaError::UninstallFailed { .. } => "command",
            OtaError::ChecksumOutput { .. } | OtaError::ChecksumMismatch { .. } => "integrity",
            OtaError::ArtifactMismatch { .. } | OtaError::InstallVerification { .. } => {
                "verification"
            }
            OtaError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, OtaError>;
