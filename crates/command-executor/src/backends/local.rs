//! Local process execution backend

use async_process::{Child, Stdio};
use async_trait::async_trait;
use futures::stream::Stream;
use futures_lite::io::{AsyncBufReadExt, BufReader, Split};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::debug;

use crate::command::Command;
use crate::error::{Error, Result};
use crate::event::{LogFilter, LogSource, NoOpFilter, ProcessEvent, ProcessEventType};
use crate::launcher::Launcher;
use crate::process::{ExitStatus, ProcessHandle};

/// Launcher for executing processes on this machine
#[derive(Clone)]
pub struct LocalLauncher {
    filter: Arc<dyn LogFilter>,
}

impl LocalLauncher {
    /// Create a launcher that passes every line through
    pub fn new() -> Self {
        Self {
            filter: Arc::new(NoOpFilter),
        }
    }

    /// Apply `filter` to every stdout/stderr line of launched processes
    pub fn with_filter<F: LogFilter + 'static>(mut self, filter: F) -> Self {
        self.filter = Arc::new(filter);
        self
    }
}

impl Default for LocalLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LocalLauncher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalLauncher").finish_non_exhaustive()
    }
}

/// A handle to control a local process
pub struct LocalProcessHandle {
    child: Child,
}

/// Stream of stdout/stderr lines of a local process.
///
/// Lines are split on raw `\n` bytes and decoded lossily, so output that is
/// not valid UTF-8 never ends the stream.
pub struct ProcessEventStream {
    stdout: Option<Split<BufReader<async_process::ChildStdout>>>,
    stderr: Option<Split<BufReader<async_process::ChildStderr>>>,
    filter: Arc<dyn LogFilter>,
    started_sent: bool,
    child_id: u32,
}

#[async_trait]
impl Launcher for LocalLauncher {
    type EventStream = ProcessEventStream;
    type Handle = LocalProcessHandle;

    async fn launch(&self, command: Command) -> Result<(Self::EventStream, Self::Handle)> {
        let program = command.get_program().to_string_lossy().into_owned();
        debug!("Spawning: {}", command);

        let mut async_cmd = command.prepare();
        async_cmd.stdin(Stdio::null());
        async_cmd.stdout(Stdio::piped());
        async_cmd.stderr(Stdio::piped());

        let mut child = async_cmd
            .spawn()
            .map_err(|e| Error::from_spawn(program, e))?;

        let child_id = child.id();
        let stdout = child.stdout.take().map(|s| BufReader::new(s).split(b'\n'));
        let stderr = child.stderr.take().map(|s| BufReader::new(s).split(b'\n'));

        let events = ProcessEventStream {
            stdout,
            stderr,
            filter: Arc::clone(&self.filter),
            started_sent: false,
            child_id,
        };

        let handle = LocalProcessHandle { child };

        Ok((events, handle))
    }
}

impl LocalProcessHandle {
    #[cfg(unix)]
    fn send_signal(&self, signal: nix::sys::signal::Signal) -> Result<()> {
        use nix::sys::signal;
        use nix::unistd::Pid;

        let pid = Pid::from_raw(self.child.id() as i32);
        match signal::kill(pid, signal) {
            Ok(()) => Ok(()),
            // Already reaped; nothing left to signal.
            Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => Err(Error::signal_failed(signal as i32, e.to_string())),
        }
    }
}

#[async_trait]
impl ProcessHandle for LocalProcessHandle {
    fn pid(&self) -> Option<u32> {
        Some(self.child.id())
    }

    async fn wait(&mut self) -> Result<ExitStatus> {
        let status = self.child.status().await?;

        Ok(status.into())
    }

    async fn terminate(&mut self) -> Result<()> {
        #[cfg(unix)]
        {
            self.send_signal(nix::sys::signal::Signal::SIGTERM)
        }

        #[cfg(not(unix))]
        {
            self.child
                .kill()
                .map_err(|e| Error::signal_failed(-1, e.to_string()))
        }
    }

    async fn kill(&mut self) -> Result<()> {
        #[cfg(unix)]
        {
            self.send_signal(nix::sys::signal::Signal::SIGKILL)
        }

        #[cfg(not(unix))]
        {
            self.child
                .kill()
                .map_err(|e| Error::signal_failed(-1, e.to_string()))
        }
    }
}

impl Drop for LocalProcessHandle {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}

impl Stream for ProcessEventStream {
    type Item = ProcessEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        if !this.started_sent {
            this.started_sent = true;
            let event = ProcessEvent::new(ProcessEventType::Started { pid: this.child_id });
            return Poll::Ready(Some(event));
        }

        loop {
            let mut progressed = false;

            if let Some(stdout) = &mut this.stdout {
                match Pin::new(stdout).poll_next(cx) {
                    Poll::Ready(Some(Ok(bytes))) => {
                        let line = String::from_utf8_lossy(&bytes);
                        if let Some(kept) = this.filter.filter(&line, LogSource::Stdout) {
                            return Poll::Ready(Some(ProcessEvent::stdout(kept)));
                        }
                        progressed = true;
                    }
                    Poll::Ready(Some(Err(e))) => {
                        debug!("stdout read failed: {}", e);
                        this.stdout = None;
                    }
                    Poll::Ready(None) => this.stdout = None,
                    Poll::Pending => {}
                }
            }

            if let Some(stderr) = &mut this.stderr {
                match Pin::new(stderr).poll_next(cx) {
                    Poll::Ready(Some(Ok(bytes))) => {
                        let line = String::from_utf8_lossy(&bytes);
                        if let Some(kept) = this.filter.filter(&line, LogSource::Stderr) {
                            return Poll::Ready(Some(ProcessEvent::stderr(kept)));
                        }
                        progressed = true;
                    }
                    Poll::Ready(Some(Err(e))) => {
                        debug!("stderr read failed: {}", e);
                        this.stderr = None;
                    }
                    Poll::Ready(None) => this.stderr = None,
                    Poll::Pending => {}
                }
            }

            if this.stdout.is_none() && this.stderr.is_none() {
                return Poll::Ready(None);
            }

            // A dropped line means a reader may still have buffered data.
            if !progressed {
                return Poll::Pending;
            }
        }
    }
}
