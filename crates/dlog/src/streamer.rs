//! Streaming `docker service logs` output through the line processor.

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::highlight::LineProcessor;
use command_executor::{Command, ExitStatus, Launcher, ProcessEvent, ProcessHandle};
use futures::StreamExt;
use futures_lite::future;
use smol::Timer;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, warn};

const SIGINT: i32 = 2;
const SHELL_SIGINT_EXIT: i32 = 130;

/// How long a terminated log command may take to exit before it is killed
const TERMINATE_GRACE: Duration = Duration::from_secs(2);

/// `docker service logs --raw --tail <lines> [--follow] <service>`
pub fn logs_command(service: &str, lines: u64, follow: bool) -> Command {
    Command::builder("docker")
        .args(["service", "logs", "--raw", "--tail"])
        .arg(lines.to_string())
        .arg_if(follow, "--follow")
        .arg(service)
        .build()
}

/// How a stream ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The log command finished on its own
    Finished,
    /// The stream was cancelled by the user
    Interrupted,
}

enum Step {
    Event(Option<ProcessEvent>),
    Cancelled,
}

/// Runs the log command and feeds every output line to a [`LineProcessor`]
#[derive(Debug)]
pub struct LogStreamer<'a, L: Launcher> {
    launcher: &'a L,
}

impl<'a, L: Launcher> LogStreamer<'a, L> {
    /// Stream through `launcher`
    pub fn new(launcher: &'a L) -> Self {
        Self { launcher }
    }

    /// Run `command` until its output ends or `cancel` fires.
    ///
    /// Stdout and stderr lines are both treated as log output. A non-zero
    /// exit of the command becomes [`Error::RemoteCommand`] unless the stream
    /// was interrupted.
    pub async fn stream<W: Write>(
        &self,
        command: Command,
        processor: &mut LineProcessor,
        out: &mut W,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome> {
        let (mut events, mut handle) = self.launcher.launch(command).await?;
        debug!(pid = ?handle.pid(), "Log command started");

        loop {
            if cancel.is_cancelled() {
                return self.interrupt(&mut handle, processor, out).await;
            }

            // Cancellation is polled first so a chatty stream cannot starve it.
            let step = future::or(
                async {
                    cancel.cancelled().await;
                    Step::Cancelled
                },
                async { Step::Event(events.next().await) },
            )
            .await;

            match step {
                Step::Cancelled => return self.interrupt(&mut handle, processor, out).await,
                Step::Event(None) => break,
                Step::Event(Some(event)) => {
                    if let Some(line) = event.line() {
                        processor.push(line, out)?;
                        out.flush()?;
                    }
                }
            }
        }

        processor.finish(out)?;
        out.flush()?;

        let status = handle.wait().await?;
        debug!("Log command exited: {:?}", status);

        if status.success() {
            Ok(StreamOutcome::Finished)
        } else if cancel.is_cancelled() || interrupted_by_user(&status) {
            Ok(StreamOutcome::Interrupted)
        } else {
            Err(Error::RemoteCommand {
                code: status.code,
                stderr: String::new(),
            })
        }
    }

    async fn interrupt<W: Write>(
        &self,
        handle: &mut L::Handle,
        processor: &mut LineProcessor,
        out: &mut W,
    ) -> Result<StreamOutcome> {
        debug!("Stopping log stream");
        processor.finish(out)?;
        out.flush()?;

        if let Err(e) = handle.terminate().await {
            warn!("Failed to stop log command: {}", e);
        }
        stop_child(handle).await;
        Ok(StreamOutcome::Interrupted)
    }
}

/// Reap the terminated child, killing it if it outlives the grace period
async fn stop_child<H: ProcessHandle>(handle: &mut H) {
    let exited = future::or(async { Some(handle.wait().await) }, async {
        Timer::after(TERMINATE_GRACE).await;
        None
    })
    .await;

    let status = match exited {
        Some(status) => status,
        None => {
            debug!("Log command ignored SIGTERM; killing it");
            if let Err(e) = handle.kill().await {
                warn!("Failed to kill log command: {}", e);
            }
            handle.wait().await
        }
    };

    match status {
        Ok(status) => debug!("Log command stopped: {:?}", status),
        Err(e) => warn!("Failed to reap log command: {}", e),
    }
}

/// The child died from the same Ctrl+C that reached us
fn interrupted_by_user(status: &ExitStatus) -> bool {
    status.signal == Some(SIGINT) || status.code == Some(SHELL_SIGINT_EXIT)
}
