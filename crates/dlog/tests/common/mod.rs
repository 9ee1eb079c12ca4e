//! Scripted launcher standing in for ssh/docker in tests

#![allow(dead_code)]

use async_trait::async_trait;
use command_executor::{
    Command, Error, ExitStatus, Launcher, ProcessEvent, ProcessEventType, ProcessHandle, Result,
};
use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// What one launched command prints and how it exits
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub code: i32,
    /// Keep the stream open after the scripted output, like `--follow`
    pub hang: bool,
}

impl Script {
    pub fn ok<S: AsRef<str>>(stdout: &[S]) -> Self {
        Self {
            stdout: stdout.iter().map(|s| s.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing(code: i32, stderr: &str) -> Self {
        Self {
            stderr: vec![stderr.to_string()],
            code,
            ..Self::default()
        }
    }

    pub fn hanging<S: AsRef<str>>(stdout: &[S]) -> Self {
        Self {
            hang: true,
            ..Self::ok(stdout)
        }
    }
}

/// Replays one [`Script`] per launch and records the commands it was given
#[derive(Default)]
pub struct ScriptedLauncher {
    scripts: Mutex<VecDeque<Script>>,
    launched: Mutex<Vec<Command>>,
    terminated: Arc<AtomicBool>,
}

impl ScriptedLauncher {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            ..Self::default()
        }
    }

    pub fn launched(&self) -> Vec<Command> {
        self.launched.lock().unwrap().clone()
    }

    pub fn was_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

pub struct ScriptedHandle {
    code: i32,
    terminated: Arc<AtomicBool>,
}

pub type ScriptedStream = Pin<Box<dyn Stream<Item = ProcessEvent> + Send>>;

#[async_trait]
impl Launcher for ScriptedLauncher {
    type EventStream = ScriptedStream;
    type Handle = ScriptedHandle;

    async fn launch(&self, command: Command) -> Result<(Self::EventStream, Self::Handle)> {
        self.launched.lock().unwrap().push(command);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::CommandNotFound {
                command: "ssh".to_string(),
            })?;

        let mut events = vec![ProcessEvent::new(ProcessEventType::Started { pid: 4242 })];
        events.extend(script.stdout.into_iter().map(ProcessEvent::stdout));
        events.extend(script.stderr.into_iter().map(ProcessEvent::stderr));

        let stream: ScriptedStream = if script.hang {
            Box::pin(stream::iter(events).chain(stream::pending()))
        } else {
            Box::pin(stream::iter(events))
        };

        let handle = ScriptedHandle {
            code: script.code,
            terminated: Arc::clone(&self.terminated),
        };
        Ok((stream, handle))
    }
}

#[async_trait]
impl ProcessHandle for ScriptedHandle {
    fn pid(&self) -> Option<u32> {
        Some(4242)
    }

    async fn wait(&mut self) -> Result<ExitStatus> {
        if self.terminated.load(Ordering::SeqCst) {
            Ok(ExitStatus {
                code: None,
                signal: Some(15),
            })
        } else {
            Ok(ExitStatus::from_code(self.code))
        }
    }

    async fn terminate(&mut self) -> Result<()> {
        self.terminated.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn kill(&mut self) -> Result<()> {
        self.terminate().await
    }
}

/// Command arguments as plain strings
pub fn args_of(command: &Command) -> Vec<String> {
    command
        .get_args()
        .iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}
