//! Command line parsing into an immutable [`Request`].

use crate::config::Config;
use crate::error::{Error, Result};
use crate::target::Target;
use clap::Parser;
use clap::error::ErrorKind;
use std::ffi::OsString;
use std::num::IntErrorKind;
use std::path::PathBuf;

/// Number of log lines fetched when `-n` is not given
pub const DEFAULT_LINES: u64 = 100;

/// Largest `--tail` value handed to docker; bigger counts are clamped
pub const MAX_LINES: u64 = i64::MAX as u64;

#[derive(Parser, Debug)]
#[command(name = "dlog")]
#[command(about = "Search and follow Docker Swarm service logs on a remote host")]
#[command(version)]
#[command(after_help = "Examples:\n  dlog user@host my-service ERROR\n  dlog my-api ERROR -n 200 -i\n\nThe default target is read from [default] target in dlog.conf next to the executable.")]
pub struct Cli {
    /// [user@host] <service> [keyword]
    #[arg(value_name = "ARGS")]
    pub positional: Vec<String>,

    /// Number of recent lines to show
    #[arg(
        short = 'n',
        long,
        value_name = "LINES",
        default_value_t = DEFAULT_LINES,
        value_parser = parse_lines,
        allow_negative_numbers = true
    )]
    pub lines: u64,

    /// Follow log output in real time
    #[arg(short, long)]
    pub follow: bool,

    /// Match the keyword case-insensitively
    #[arg(short, long)]
    pub ignore_case: bool,

    /// Only print log entries that contain the keyword
    #[arg(short = 'm', long)]
    pub matching_only: bool,

    /// Run docker on this machine instead of over SSH
    #[arg(long)]
    pub local: bool,

    /// Config file to read the default target from
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print debug diagnostics on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_lines(value: &str) -> std::result::Result<u64, String> {
    let value = value.trim();
    match value.parse::<u64>() {
        Ok(0) => Err("must be a positive integer, got 0".to_string()),
        Ok(n) => Ok(n.min(MAX_LINES)),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(MAX_LINES),
        Err(_) if is_negative_integer(value) => {
            Err(format!("must be a positive integer, got {}", value))
        }
        Err(_) => Err(format!("'{}' is not a number", value)),
    }
}

fn is_negative_integer(value: &str) -> bool {
    value
        .strip_prefix('-')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

impl Cli {
    /// Parse arguments, turning every clap failure except help/version into
    /// [`Error::InvalidArgument`].
    ///
    /// Help and version requests come back as `Ok(Err(..))` so the caller can
    /// print them and exit successfully.
    pub fn parse_args<I, T>(args: I) -> Result<std::result::Result<Self, clap::Error>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(cli) => Ok(Ok(cli)),
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                Ok(Err(e))
            }
            Err(e) => Err(Error::InvalidArgument(first_line(&e))),
        }
    }
}

fn first_line(e: &clap::Error) -> String {
    let rendered = e.render().to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.trim_start_matches("error:").trim().to_string()
}

/// What the user asked for, resolved against the config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Where docker runs
    pub target: Target,
    /// Partial service name to look up
    pub service_fragment: String,
    /// Keyword to highlight, if any
    pub keyword: Option<String>,
    /// Lines of history to fetch
    pub lines: u64,
    /// Keep streaming until interrupted
    pub follow: bool,
    /// Match the keyword case-insensitively
    pub ignore_case: bool,
    /// Suppress log entries without a keyword match
    pub matching_only: bool,
}

impl Request {
    /// Resolve positional arguments.
    ///
    /// A first token containing `@` is the SSH target; otherwise the config
    /// default is used. The next token is the service fragment and the one
    /// after it the keyword.
    pub fn from_cli(cli: Cli, config: &Config) -> Result<Self> {
        let mut tokens = cli.positional.into_iter();

        let (target, service) = if cli.local {
            (Target::Local, tokens.next())
        } else {
            match tokens.next() {
                Some(first) if Target::looks_like_remote(&first) => {
                    (Target::Remote(first), tokens.next())
                }
                first => {
                    let target = config.default_target().ok_or(Error::MissingTarget)?;
                    (Target::Remote(target.to_string()), first)
                }
            }
        };

        let service_fragment = service
            .filter(|s| !s.is_empty())
            .ok_or(Error::MissingService)?;
        let keyword = tokens.next().filter(|k| !k.is_empty());

        if let Some(extra) = tokens.next() {
            return Err(Error::InvalidArgument(format!(
                "unexpected argument '{}'",
                extra
            )));
        }

        Ok(Request {
            target,
            service_fragment,
            keyword,
            lines: cli.lines,
            follow: cli.follow,
            ignore_case: cli.ignore_case,
            matching_only: cli.matching_only,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Result<Cli> {
        let argv = std::iter::once("dlog").chain(args.iter().copied());
        match Cli::parse_args(argv)? {
            Ok(cli) => Ok(cli),
            Err(e) => panic!("unexpected help/version: {}", e),
        }
    }

    fn request(args: &[&str], config: &Config) -> Result<Request> {
        Request::from_cli(cli(args)?, config)
    }

    #[test]
    fn test_config_target_with_fragment_and_keyword() {
        let config = Config::with_default_target("dev@box");
        let req = request(&["my-app", "ERROR"], &config).unwrap();

        assert_eq!(
            req,
            Request {
                target: Target::Remote("dev@box".into()),
                service_fragment: "my-app".into(),
                keyword: Some("ERROR".into()),
                lines: 100,
                follow: false,
                ignore_case: false,
                matching_only: false,
            }
        );
    }

    #[test]
    fn test_explicit_target_and_flags() {
        let req = request(
            &["user@host", "api", "ERROR", "-n", "500", "-i"],
            &Config::default(),
        )
        .unwrap();

        assert_eq!(req.target, Target::Remote("user@host".into()));
        assert_eq!(req.service_fragment, "api");
        assert_eq!(req.keyword.as_deref(), Some("ERROR"));
        assert_eq!(req.lines, 500);
        assert!(req.ignore_case);
        assert!(!req.follow);
    }

    #[test]
    fn test_explicit_target_beats_config() {
        let config = Config::with_default_target("dev@box");
        let req = request(&["ops@prod", "api"], &config).unwrap();
        assert_eq!(req.target, Target::Remote("ops@prod".into()));
        assert_eq!(req.keyword, None);
    }

    #[test]
    fn test_flags_may_come_first() {
        let req = request(&["-f", "--lines", "20", "user@host", "api"], &Config::default()).unwrap();
        assert!(req.follow);
        assert_eq!(req.lines, 20);
        assert_eq!(req.service_fragment, "api");
    }

    #[test]
    fn test_missing_target() {
        for args in [&["my-app"][..], &["my-app", "ERROR"][..], &[][..]] {
            assert!(matches!(
                request(args, &Config::default()),
                Err(Error::MissingTarget)
            ));
        }
    }

    #[test]
    fn test_missing_service() {
        assert!(matches!(
            request(&["user@host"], &Config::default()),
            Err(Error::MissingService)
        ));
        assert!(matches!(
            request(&[], &Config::with_default_target("dev@box")),
            Err(Error::MissingService)
        ));
    }

    #[test]
    fn test_invalid_line_counts() {
        for bad in ["0", "-5", "abc", "1.5", ""] {
            let result = request(&["user@host", "api", "-n", bad], &Config::default());
            assert!(
                matches!(result, Err(Error::InvalidArgument(_))),
                "-n {:?} should be rejected, got {:?}",
                bad,
                result
            );
        }
    }

    #[test]
    fn test_unknown_flag() {
        assert!(matches!(
            request(&["user@host", "api", "--bogus"], &Config::default()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_too_many_positionals() {
        let result = request(&["user@host", "api", "ERROR", "extra"], &Config::default());
        assert!(matches!(result, Err(Error::InvalidArgument(msg)) if msg.contains("extra")));
    }

    #[test]
    fn test_local_target() {
        let req = request(&["--local", "api", "WARN"], &Config::default()).unwrap();
        assert_eq!(req.target, Target::Local);
        assert_eq!(req.service_fragment, "api");
        assert_eq!(req.keyword.as_deref(), Some("WARN"));
    }

    #[test]
    fn test_matching_only_flag() {
        let req = request(&["user@host", "api", "ERROR", "-m"], &Config::default()).unwrap();
        assert!(req.matching_only);
    }

    #[test]
    fn test_help_is_not_an_error() {
        let parsed = Cli::parse_args(["dlog", "--help"]).unwrap();
        assert!(matches!(parsed, Err(e) if e.kind() == ErrorKind::DisplayHelp));
    }

    #[test]
    fn test_parse_lines() {
        assert_eq!(parse_lines("1"), Ok(1));
        assert_eq!(parse_lines(" 250 "), Ok(250));
        assert!(parse_lines("0").is_err());
        assert!(parse_lines("-1").is_err());
        assert!(parse_lines("ten").is_err());
        assert!(parse_lines("-99999999999999999999999").is_err());
    }

    #[test]
    fn test_large_line_counts_are_accepted() {
        assert_eq!(parse_lines("99999999999"), Ok(99_999_999_999));
        assert_eq!(parse_lines("99999999999999999999999"), Ok(MAX_LINES));

        let req = request(&["user@host", "api", "-n", "99999999999"], &Config::default()).unwrap();
        assert_eq!(req.lines, 99_999_999_999);
    }
}
