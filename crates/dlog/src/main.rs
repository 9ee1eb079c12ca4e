//! `dlog` command line entry point.

use dlog::cancel::cancel_on_signals;
use dlog::{CancellationToken, Cli, Config, Error, Request, StreamOutcome, app};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";
const USAGE: &str = "Usage: dlog [user@host] <service> [keyword] [-n LINES] [-f] [-i]";

fn main() -> ExitCode {
    let cli = match Cli::parse_args(std::env::args_os()) {
        Ok(Ok(cli)) => cli,
        Ok(Err(help)) => help.exit(),
        Err(e) => return report(&e),
    };

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref());
    let request = match Request::from_cli(cli, &config) {
        Ok(request) => request,
        Err(e) => return report(&e),
    };

    let cancel = CancellationToken::new();
    if let Err(e) = cancel_on_signals(cancel.clone()) {
        warn!("Could not install signal handler: {}", e);
    }

    let launcher = request.target.launcher(config.ssh());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match smol::block_on(app::run(&request, &launcher, &mut out, &cancel)) {
        Ok(StreamOutcome::Finished) => ExitCode::SUCCESS,
        Ok(StreamOutcome::Interrupted) => {
            eprintln!("\nExiting log stream.");
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn report(error: &Error) -> ExitCode {
    eprintln!("{}Error: {}{}", RED, error, RESET);

    match error {
        Error::MissingTarget => {
            eprintln!("Please provide it as the first argument, or set a default in the config file.");
            eprintln!("Example CLI: dlog user@host my-service ERROR");
            eprintln!("Example config (dlog.conf next to the dlog binary):\n[default]\ntarget = user@host");
        }
        Error::Executor(command_executor::Error::CommandNotFound { command }) => {
            eprintln!("Is '{}' installed and in your PATH?", command);
        }
        e if e.is_usage() => {
            eprintln!("{}", USAGE);
            eprintln!("Try 'dlog --help' for more information.");
        }
        _ => {}
    }

    ExitCode::from(u8::try_from(error.exit_code()).unwrap_or(1))
}
