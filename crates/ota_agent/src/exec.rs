//! Process execution
//!
//! Single command execution layer used by every OS collaborator:
//! - Runs a program with arguments (no shell)
//! - Captures exit code, stdout, stderr and duration
//! - Classifies the outcome without interpreting the output
//!
//! Callers that need "stdout or failure" use [`CommandResult::into_stdout`].

use crate::error::{OtaError, Result};
use std::process::Command;
use std::time::Instant;
use tracing::debug;

/// Maximum output length to capture
const MAX_OUTPUT_BYTES: usize = 256 * 1024;

/// Execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Exit code 0
    Success,
    /// Ran but returned non-zero
    NonZeroExit,
    /// Program not found
    CommandNotFound,
    /// Permission denied
    PermissionDenied,
    /// Other OS error while spawning
    OsError,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NonZeroExit => "non-zero exit",
            Self::CommandNotFound => "command not found",
            Self::PermissionDenied => "permission denied",
            Self::OsError => "OS error",
        }
    }
}

/// Result of a command execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Program and arguments, space separated
    pub full_command: String,
    /// Exit code (-1 if the program never ran or was killed)
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    pub status: ExecutionStatus,
}

impl CommandResult {
    /// Successful result carrying `stdout`, used by test doubles
    pub fn success(full_command: impl Into<String>, stdout: impl Into<String>) -> Self {
        Self {
            full_command: full_command.into(),
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 0,
            status: ExecutionStatus::Success,
        }
    }

    /// Failed result with the given exit code, used by test doubles
    pub fn failure(full_command: impl Into<String>, exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            full_command: full_command.into(),
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 0,
            status: ExecutionStatus::NonZeroExit,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// Stdout on success, an error otherwise
    pub fn into_stdout(self) -> Result<String> {
        match self.status {
            ExecutionStatus::Success => Ok(self.stdout),
            ExecutionStatus::NonZeroExit => Err(OtaError::CommandFailed {
                command: self.full_command,
                exit_code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            }),
            ExecutionStatus::CommandNotFound
            | ExecutionStatus::PermissionDenied
            | ExecutionStatus::OsError => Err(OtaError::CommandSpawn {
                command: self.full_command,
                source: std::io::Error::new(spawn_error_kind(self.status), self.stderr),
            }),
        }
    }
}

fn spawn_error_kind(status: ExecutionStatus) -> std::io::ErrorKind {
    match status {
        ExecutionStatus::CommandNotFound => std::io::ErrorKind::NotFound,
        ExecutionStatus::PermissionDenied => std::io::ErrorKind::PermissionDenied,
        _ => std::io::ErrorKind::Other,
    }
}

/// Runs external programs on behalf of the agent
pub trait CommandRunner {
    fn execute(&self, program: &str, args: &[&str]) -> CommandResult;

    /// Run and return stdout, failing on spawn errors and non-zero exit
    fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        self.execute(program, args).into_stdout()
    }
}

/// Executes commands on the real system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn execute(&self, program: &str, args: &[&str]) -> CommandResult {
        let full_command = render_command(program, args);
        debug!("exec: {}", full_command);

        let start = Instant::now();
        let output = Command::new(program).args(args).output();
        let duration_ms = start.elapsed().as_millis() as u64;

        match output {
            Ok(output) => {
                let status = if output.status.success() {
                    ExecutionStatus::Success
                } else {
                    ExecutionStatus::NonZeroExit
                };

                CommandResult {
                    full_command,
                    exit_code: output.status.code().unwrap_or(-1),
                    stdout: truncate_output(&output.stdout),
                    stderr: truncate_output(&output.stderr),
                    duration_ms,
                    status,
                }
            }
            Err(e) => {
                let status = match e.kind() {
                    std::io::ErrorKind::NotFound => ExecutionStatus::CommandNotFound,
                    std::io::ErrorKind::PermissionDenied => ExecutionStatus::PermissionDenied,
                    _ => ExecutionStatus::OsError,
                };

                CommandResult {
                    full_command,
                    exit_code: -1,
                    stdout: String::new(),
                    stderr: e.to_string(),
                    duration_ms,
                    status,
                }
            }
        }
    }
}

/// Program and arguments joined for logs and errors
pub fn render_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

fn truncate_output(bytes: &[u8]) -> String {
    let slice = if bytes.len() > MAX_OUTPUT_BYTES {
        &bytes[..MAX_OUTPUT_BYTES]
    } else {
        bytes
    };
    String::from_utf8_lossy(slice).to_string()
}
