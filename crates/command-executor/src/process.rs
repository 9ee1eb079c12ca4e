//! Process control traits and exit types

use crate::error::Result;
use async_trait::async_trait;

/// A handle to control a running process
#[async_trait]
pub trait ProcessHandle: Send + Sync {
    /// Get the process ID
    fn pid(&self) -> Option<u32>;

    /// Wait for the process to complete and return its exit status
    async fn wait(&mut self) -> Result<ExitStatus>;

    /// Send SIGTERM (or equivalent) for graceful shutdown
    async fn terminate(&mut self) -> Result<()>;

    /// Send SIGKILL (or equivalent) to forcefully stop the process
    async fn kill(&mut self) -> Result<()>;
}

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    /// Exit code if the process exited normally
    pub code: Option<i32>,
    /// Signal that terminated the process (always `None` off Unix)
    pub signal: Option<i32>,
}

impl ExitStatus {
    /// A normal exit with the given code
    pub fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    /// Returns true if the process exited successfully (code 0)
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

/// Captured result of a command that ran to completion
#[derive(Debug, Clone)]
pub struct ExitResult {
    /// How the process exited
    pub status: ExitStatus,
    /// Stdout lines, in order
    pub stdout: Vec<String>,
    /// Stderr lines, in order
    pub stderr: Vec<String>,
}

impl ExitResult {
    /// Stderr joined back into a single block of text
    pub fn stderr_text(&self) -> String {
        self.stderr.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        assert!(ExitStatus::from_code(0).success());
        assert!(!ExitStatus::from_code(255).success());
        let signalled = ExitStatus {
            code: None,
            signal: Some(2),
        };
        assert!(!signalled.success());
        assert_eq!(signalled.signal, Some(2));
    }

    #[test]
    fn test_stderr_text() {
        let result = ExitResult {
            status: ExitStatus::from_code(1),
            stdout: vec![],
            stderr: vec!["first".into(), "second".into()],
        };
        assert_eq!(result.stderr_text(), "first\nsecond");
    }
}
