//! Backend implementations for different execution contexts
//!
//! Only local spawning lives here; remote execution is expressed by wrapping
//! the command with a [`crate::layered::SshLayer`] and launching the result
//! locally.

pub mod local;
pub use local::{LocalLauncher, LocalProcessHandle, ProcessEventStream};
