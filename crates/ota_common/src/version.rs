//! Version reconciliation primitives
//!
//! Package versions are plain integer version codes. OTA versions are build
//! stamps such as `2024_03_01` or a UTC epoch read from a system property;
//! both compare as integers once separators are removed.

use std::cmp::Ordering;
use std::fmt;

/// Error produced when a build stamp has no integer reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStampError {
    pub raw: String,
}

impl fmt::Display for BuildStampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a numeric build stamp: {:?}", self.raw)
    }
}

impl std::error::Error for BuildStampError {}

/// Strip `_` separators, newlines and surrounding whitespace
///
/// Idempotent: normalising an already normalised stamp returns it unchanged.
pub fn normalize_build_stamp(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '_' && *c != '\n' && *c != '\r')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parse a build stamp into its integer value
pub fn parse_build_stamp(raw: &str) -> Result<u64, BuildStampError> {
    normalize_build_stamp(raw)
        .parse::<u64>()
        .map_err(|_| BuildStampError {
            raw: raw.to_string(),
        })
}

/// Compare the server's target against the local version
///
/// `Greater` means the server carries a newer version than the device.
pub fn compare_versions<T: Ord>(server: T, local: T) -> Ordering {
    server.cmp(&local)
}

/// Server version strictly higher than local
pub fn is_server_higher<T: Ord>(server: T, local: T) -> bool {
    compare_versions(server, local) == Ordering::Greater
}

/// An install or OTA update should run
pub fn needs_upgrade(ordering: Ordering) -> bool {
    ordering == Ordering::Greater
}

/// A downgrade request should run: server target is equal or older
pub fn needs_downgrade(ordering: Ordering) -> bool {
    ordering != Ordering::Greater
}
