//! Execution layer implementations.

use crate::{
    Command,
    error::{Error, Result},
};
use std::path::PathBuf;

/// Trait for execution layers that can wrap commands
pub trait ExecutionLayer: Send + Sync + std::fmt::Debug {
    /// Wrap a command with this layer's execution context
    fn wrap_command(&self, command: Command) -> Result<Command>;

    /// Get a description of this layer for debugging
    fn description(&self) -> String;
}

/// Layer for SSH execution - wraps commands to run over SSH
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshLayer {
    /// SSH destination (user@host or just host)
    pub destination: String,
    /// SSH port (optional)
    pub port: Option<u16>,
    /// SSH identity file (optional)
    pub identity_file: Option<PathBuf>,
    /// Additional SSH options, passed before the destination
    pub options: Vec<String>,
}

impl SshLayer {
    /// Create a new SSH layer
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            port: None,
            identity_file: None,
            options: Vec::new(),
        }
    }

    /// Set the SSH port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the SSH identity file
    pub fn with_identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// Add an SSH option
    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }
}

impl ExecutionLayer for SshLayer {
    fn wrap_command(&self, command: Command) -> Result<Command> {
        // ssh would read a leading '-' as one of its own options.
        if self.destination.trim().is_empty() || self.destination.starts_with('-') {
            return Err(Error::spawn_failed(format!(
                "invalid ssh destination '{}'",
                self.destination
            )));
        }

        let mut ssh_cmd = Command::new("ssh");
        if let Some(port) = self.port {
            ssh_cmd.arg("-p").arg(port.to_string());
        }
        if let Some(identity) = &self.identity_file {
            ssh_cmd.arg("-i").arg(identity);
        }
        for option in &self.options {
            ssh_cmd.arg(option);
        }

        ssh_cmd.arg(&self.destination);
        // ssh joins its trailing arguments with spaces and hands them to the
        // remote login shell, so the inner command travels as one escaped line.
        ssh_cmd.arg(command.to_shell_string());

        Ok(ssh_cmd)
    }

    fn description(&self) -> String {
        format!("SSH to {}", self.destination)
    }
}
