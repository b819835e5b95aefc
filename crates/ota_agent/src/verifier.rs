//! Artifact integrity checks
//!
//! The digest comes from the device's checksum tool (`md5sum` by default),
//! whose output starts with the hex digest. The comparison is an exact string
//! match against the value the server declared.

use crate::error::{OtaError, Result};
use crate::exec::CommandRunner;
use std::path::Path;
use tracing::{debug, info};

/// Length of a hex encoded MD5 digest
pub const DIGEST_HEX_LEN: usize = 32;

pub struct IntegrityVerifier<'a> {
    runner: &'a dyn CommandRunner,
    tool: &'a str,
}

impl<'a> IntegrityVerifier<'a> {
    pub fn new(runner: &'a dyn CommandRunner, tool: &'a str) -> Self {
        Self { runner, tool }
    }

    /// Hex digest of the file at `path`
    pub fn checksum(&self, path: &Path) -> Result<String> {
        let path_arg = path.to_string_lossy().into_owned();
        let out = self.runner.run(self.tool, &[path_arg.as_str()])?;
        extract_digest(&out).ok_or_else(|| OtaError::ChecksumOutput {
            path: path.to_path_buf(),
        })
    }

    /// Fail with `ChecksumMismatch` unless the file matches `expected`
    pub fn verify(&self, path: &Path, expected: &str) -> Result<()> {
        let actual = self.checksum(path)?;
        debug!("checksum of {}: {}", path.display(), actual);
        if actual != expected {
            return Err(OtaError::ChecksumMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
        info!("MD5 matched for {}", path.display());
        Ok(())
    }
}

/// Fixed-length hex prefix of a checksum tool's output
pub fn extract_digest(output: &str) -> Option<String> {
    let digest: String = output.trim_start().chars().take(DIGEST_HEX_LEN).collect();
    if digest.len() == DIGEST_HEX_LEN && digest.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(digest)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::SystemRunner;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_extract_digest() {
        let out = "d41d8cd98f00b204e9800998ecf8427e  /cache/update.zip\n";
        assert_eq!(
            extract_digest(out),
            Some("d41d8cd98f00b204e9800998ecf8427e".to_string())
        );
        assert_eq!(extract_digest("short"), None);
        assert_eq!(extract_digest(""), None);
        assert_eq!(extract_digest("md5sum: /cache/x: No such file or directory"), None);
    }

    #[test]
    fn test_real_md5sum() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        fs::write(&path, b"").unwrap();

        let runner = SystemRunner::new();
        let verifier = IntegrityVerifier::new(&runner, "md5sum");
        // md5sum ships with coreutils; skip quietly where it is absent
        if let Ok(digest) = verifier.checksum(&path) {
            assert_eq!(digest, "d41d8cd98f00b204e9800998ecf8427e");
            assert!(verifier.verify(&path, "d41d8cd98f00b204e9800998ecf8427e").is_ok());
            assert!(matches!(
                verifier.verify(&path, "D41D8CD98F00B204E9800998ECF8427E"),
                Err(OtaError::ChecksumMismatch { .. })
            ));
        }
    }
}
