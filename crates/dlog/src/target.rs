//! Where docker commands run: on this machine or through `ssh`.

use command_executor::backends::LocalLauncher;
use command_executor::event::TrimCarriageReturn;
use command_executor::layered::{LayeredExecutor, SshLayer};
use std::fmt;
use std::path::PathBuf;

/// Connection settings for the `ssh` client, read from the config file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshOptions {
    /// `ssh -p`
    pub port: Option<u16>,
    /// `ssh -i`
    pub identity_file: Option<PathBuf>,
    /// Extra arguments placed before the destination, e.g. `-oBatchMode=yes`
    pub extra: Vec<String>,
}

impl SshOptions {
    fn layer(&self, destination: &str) -> SshLayer {
        let mut layer = SshLayer::new(destination);
        if let Some(port) = self.port {
            layer = layer.with_port(port);
        }
        if let Some(identity) = &self.identity_file {
            layer = layer.with_identity_file(identity);
        }
        self.extra
            .iter()
            .fold(layer, |layer, option| layer.with_option(option))
    }
}

/// Execution target for the docker commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Run `docker` directly
    Local,
    /// Run `docker` on `user@host` through the ssh client
    Remote(String),
}

impl Target {
    /// Whether a positional token names an SSH destination
    pub fn looks_like_remote(token: &str) -> bool {
        token.contains('@')
    }

    /// A launcher that runs commands at this target
    pub fn launcher(&self, ssh: &SshOptions) -> LayeredExecutor<LocalLauncher> {
        let executor = LayeredExecutor::new(LocalLauncher::new().with_filter(TrimCarriageReturn));
        match self {
            Target::Local => executor,
            Target::Remote(destination) => executor.with_layer(ssh.layer(destination)),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Local => f.write_str("localhost"),
            Target::Remote(destination) => f.write_str(destination),
        }
    }
}
