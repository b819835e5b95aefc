//! System property lookups

use crate::error::{OtaError, Result};
use crate::exec::CommandRunner;
use tracing::debug;

/// Reads system properties through the `getprop` tool
pub struct PropertyReader<'a> {
    runner: &'a dyn CommandRunner,
    getprop: &'a str,
}

impl<'a> PropertyReader<'a> {
    pub fn new(runner: &'a dyn CommandRunner, getprop: &'a str) -> Self {
        Self { runner, getprop }
    }

    /// Value of a single property, trimmed; empty when unset
    pub fn get(&self, key: &str) -> Result<String> {
        let out = self.runner.run(self.getprop, &[key])?;
        Ok(out.trim().to_string())
    }

    /// First non-empty value among `keys`, tried in order
    pub fn first_of(&self, keys: &[String]) -> Result<String> {
        for key in keys {
            let value = self.get(key)?;
            if !value.is_empty() {
                debug!("property {} = {}", key, value);
                return Ok(value);
            }
        }
        Err(OtaError::PropertyUnset {
            keys: keys.to_vec(),
        })
    }

    /// Like [`first_of`](Self::first_of), but an empty string when none is set
    pub fn first_of_or_empty(&self, keys: &[String]) -> Result<String> {
        match self.first_of(keys) {
            Ok(v) => Ok(v),
            Err(OtaError::PropertyUnset { .. }) => Ok(String::new()),
            Err(e) => Err(e),
        }
    }
}
