//! Launcher trait for executing commands in different contexts

use crate::command::Command;
use crate::error::Result;
use crate::event::{LogSource, ProcessEvent};
use crate::process::{ExitResult, ProcessHandle};
use async_trait::async_trait;
use futures::stream::Stream;

/// Something that can start a command and hand back its output and control.
///
/// Implementations decide *where* the command runs; callers only see a
/// stream of output events and a handle.
#[async_trait]
pub trait Launcher: Send + Sync + 'static {
    /// The event stream type this launcher produces
    type EventStream: Stream<Item = ProcessEvent> + Send + Unpin;

    /// The process handle type this launcher produces
    type Handle: ProcessHandle;

    /// Launch a command, returning its event stream and control handle
    async fn launch(&self, command: Command) -> Result<(Self::EventStream, Self::Handle)>;

    /// Execute a command and wait for it to complete, capturing output
    async fn execute(&self, command: Command) -> Result<ExitResult> {
        use futures::StreamExt;

        let (mut events, mut handle) = self.launch(command).await?;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        while let Some(event) = events.next().await {
            if let (Some(source), Some(data)) = (event.source(), event.data) {
                match source {
                    LogSource::Stdout => stdout.push(data),
                    LogSource::Stderr => stderr.push(data),
                }
            }
        }

        let status = handle.wait().await?;
        Ok(ExitResult {
            status,
            stdout,
            stderr,
        })
    }
}
