//! Error types for dlog

use thiserror::Error;

/// Everything that can stop a dlog run
#[derive(Debug, Error)]
pub enum Error {
    /// No `user@host` argument and no default target in the config file
    #[error("SSH target not specified")]
    MissingTarget,

    /// No service name fragment was given
    #[error("the service name is required")]
    MissingService,

    /// A flag or positional argument could not be accepted
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No listed service contains the fragment
    #[error("no service found matching '{fragment}' on {target}")]
    ServiceNotFound {
        /// The fragment that was searched for
        fragment: String,
        /// Where the services were listed
        target: String,
    },

    /// The ssh/docker chain exited unsuccessfully
    #[error("{}", describe_remote_failure(.code, .stderr))]
    RemoteCommand {
        /// Exit code of the child, when it exited normally
        code: Option<i32>,
        /// Captured stderr of the child
        stderr: String,
    },

    /// Cancelled by SIGINT/SIGTERM before any logs were streamed
    #[error("interrupted")]
    Interrupted,

    /// The ssh/docker chain could not be started at all
    #[error(transparent)]
    Executor(#[from] command_executor::Error),

    /// Writing log output failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::MissingTarget | Error::MissingService | Error::InvalidArgument(_) => 2,
            Error::RemoteCommand {
                code: Some(code), ..
            } if *code != 0 => *code,
            Error::Interrupted => 130,
            _ => 1,
        }
    }

    /// Whether this error is a usage problem worth a usage hint
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::MissingTarget | Error::MissingService | Error::InvalidArgument(_)
        )
    }
}

fn describe_remote_failure(code: &Option<i32>, stderr: &str) -> String {
    let status = match code {
        Some(code) => format!("remote command failed with exit code {}", code),
        None => "remote command was terminated by a signal".to_string(),
    };
    let stderr = stderr.trim();
    if stderr.is_empty() {
        status
    } else {
        format!("{}:\n{}", status, stderr)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_errors_exit_two() {
        assert_eq!(Error::MissingTarget.exit_code(), 2);
        assert_eq!(Error::MissingService.exit_code(), 2);
        assert_eq!(Error::InvalidArgument("-n".into()).exit_code(), 2);
        assert!(Error::MissingService.is_usage());
    }

    #[test]
    fn test_remote_exit_code_is_propagated() {
        let err = Error::RemoteCommand {
            code: Some(255),
            stderr: "ssh: connect to host box port 22: Connection refused\n".into(),
        };
        assert_eq!(err.exit_code(), 255);
        assert!(!err.is_usage());
        assert_eq!(
            err.to_string(),
            "remote command failed with exit code 255:\nssh: connect to host box port 22: Connection refused"
        );
    }

    #[test]
    fn test_remote_exit_two_is_not_usage() {
        let err = Error::RemoteCommand {
            code: Some(2),
            stderr: String::new(),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(!err.is_usage());
    }

    #[test]
    fn test_signalled_remote_exits_one() {
        let err = Error::RemoteCommand {
            code: None,
            stderr: String::new(),
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "remote command was terminated by a signal");
    }

    #[test]
    fn test_interrupted_is_not_usage() {
        assert_eq!(Error::Interrupted.exit_code(), 130);
        assert!(!Error::Interrupted.is_usage());
    }

    #[test]
    fn test_service_not_found_message() {
        let err = Error::ServiceNotFound {
            fragment: "api".into(),
            target: "dev@box".into(),
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "no service found matching 'api' on dev@box");
    }
}
