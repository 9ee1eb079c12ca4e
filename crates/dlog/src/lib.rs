//! # dlog
//!
//! Find a Docker Swarm service by a fragment of its name and print (or
//! follow) its logs, optionally highlighting a keyword. Docker runs on a
//! remote manager node through `ssh`, or locally.
//!
//! The flow is: [`cli::Cli`] → [`cli::Request`] (with the default target from
//! [`config::Config`]) → [`resolver::ServiceResolver`] →
//! [`streamer::LogStreamer`] feeding a [`highlight::LineProcessor`]. External
//! commands go through a [`command_executor::Launcher`], so tests can swap in
//! a scripted one.

#![warn(missing_docs)]

pub mod app;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod highlight;
pub mod resolver;
pub mod streamer;
pub mod target;

pub use cancel::CancellationToken;
pub use cli::{Cli, Request};
pub use config::Config;
pub use error::{Error, Result};
pub use streamer::StreamOutcome;
pub use target::{SshOptions, Target};
