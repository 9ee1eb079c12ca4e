//! Runtime-agnostic command execution library
//!
//! This crate runs external programs either on the local machine or, through
//! an [`layered::SshLayer`], on a remote host via the `ssh` client. Output is
//! exposed line by line as a stream of [`ProcessEvent`]s, and the running
//! child is controlled through a [`ProcessHandle`].

#![warn(missing_docs)]

pub mod backends;
pub mod command;
pub mod error;
pub mod event;
pub mod launcher;
pub mod layered;
pub mod process;

pub use command::Command;
pub use error::{Error, Result};
pub use event::{LogFilter, LogSource, NoOpFilter, ProcessEvent, ProcessEventType};
pub use launcher::Launcher;
pub use process::{ExitResult, ExitStatus, ProcessHandle};
