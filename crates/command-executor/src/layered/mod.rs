//! Layered execution system for runtime command composition.
//!
//! A [`LayeredExecutor`] rewrites a command through a stack of
//! [`ExecutionLayer`]s before handing it to an inner launcher. Wrapping with an
//! [`SshLayer`] is how commands run on a remote host.
//!
//! # Example
//!
//! ```rust,no_run
//! use command_executor::layered::{LayeredExecutor, SshLayer};
//! use command_executor::{Command, Launcher, backends::LocalLauncher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = LayeredExecutor::new(LocalLauncher::new())
//!     .with_layer(SshLayer::new("user@remote-host"));
//!
//! let command = Command::builder("docker").args(["service", "ls"]).build();
//! let result = executor.execute(command).await?;
//! # Ok(())
//! # }
//! ```

mod executor;
mod layers;

pub use executor::LayeredExecutor;
pub use layers::{ExecutionLayer, SshLayer};
