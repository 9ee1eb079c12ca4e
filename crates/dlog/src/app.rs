//! Wiring a [`Request`] through service resolution and log streaming.

use crate::cancel::CancellationToken;
use crate::cli::Request;
use crate::error::{Error, Result};
use crate::highlight::{HIGHLIGHT_END, HIGHLIGHT_START, LineProcessor};
use crate::resolver::ServiceResolver;
use crate::streamer::{LogStreamer, StreamOutcome, logs_command};
use command_executor::Launcher;
use std::io::Write;
use tracing::info;

/// Resolve the service named by `request` and stream its logs into `out`.
pub async fn run<L: Launcher, W: Write>(
    request: &Request,
    launcher: &L,
    out: &mut W,
    cancel: &CancellationToken,
) -> Result<StreamOutcome> {
    // Validate the keyword before touching the network.
    let mut processor = LineProcessor::new(
        request.keyword.as_deref(),
        request.ignore_case,
        request.matching_only,
    )?;

    let target = request.target.to_string();
    let service = match ServiceResolver::new(launcher, target.clone(), cancel)
        .resolve(&request.service_fragment)
        .await
    {
        Ok(service) => service,
        Err(Error::Interrupted) => return Ok(StreamOutcome::Interrupted),
        Err(e) => return Err(e),
    };
    info!("Resolved '{}' to {}", request.service_fragment, service);

    writeln!(
        out,
        "--- Streaming logs for service: {}{}{} on host: {}{}{} ---",
        HIGHLIGHT_START, service, HIGHLIGHT_END, HIGHLIGHT_START, target, HIGHLIGHT_END
    )?;

    let command = logs_command(&service, request.lines, request.follow);
    LogStreamer::new(launcher)
        .stream(command, &mut processor, out, cancel)
        .await
}
