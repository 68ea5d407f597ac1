//! Child-process contexts: the worker is a separate OS process speaking the
//! NDJSON protocol over its stdio.

use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};

use super::{ChannelEvent, ContextHandle, ContextSpawner, SpawnedContext};
use crate::error::{DispatchError, Result};
use crate::probe::WorkerCommand;
use crate::protocol::{encode_line, FrameReader, WorkerFrame, WorkerInput};

const EVENT_CHANNEL_CAPACITY: usize = 8;

/// Spawns one worker process per dispatch.
#[derive(Debug, Clone)]
pub struct ProcessSpawner {
    command: WorkerCommand,
}

impl ProcessSpawner {
    pub fn new(command: WorkerCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &WorkerCommand {
        &self.command
    }

    fn spawn_failed(&self, source: std::io::Error) -> DispatchError {
        DispatchError::SpawnFailed {
            program: self.command.program.clone(),
            source,
        }
    }
}

impl ContextSpawner for ProcessSpawner {
    fn spawn(&self, input: &WorkerInput) -> Result<SpawnedContext> {
        let line = encode_line(input).map_err(DispatchError::Encode)?;

        // A detached worker must outlive its handle.
        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(false)
            .spawn()
            .map_err(|e| self.spawn_failed(e))?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.start_kill();
                return Err(self.spawn_failed(std::io::Error::other(
                    "worker stdio was not captured",
                )));
            }
        };

        tracing::trace!(pid = ?child.id(), program = %self.command.program.display(), "Worker process started");

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (kill_tx, kill_rx) = oneshot::channel();
        tokio::spawn(pump(child, stdin, stdout, line, event_tx, kill_rx));

        Ok(SpawnedContext {
            events: event_rx,
            handle: Box::new(ProcessHandle {
                kill: Some(kill_tx),
            }),
        })
    }
}

/// Kill switch for one worker. Dropping the sender unarms it.
struct ProcessHandle {
    kill: Option<oneshot::Sender<()>>,
}

impl ContextHandle for ProcessHandle {
    fn detach(mut self: Box<Self>) {
        self.kill.take();
    }

    fn terminate(mut self: Box<Self>) {
        if let Some(kill) = self.kill.take() {
            let _ = kill.send(());
        }
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if let Some(kill) = self.kill.take() {
            let _ = kill.send(());
        }
    }
}

enum PumpEnd {
    Exited(std::io::Result<ExitStatus>),
    Killed,
}

/// Drives one worker: feeds its input, forwards its frames, reports its exit.
///
/// All events for a worker come from this task, so frames always precede
/// the `Exited` event.
async fn pump(
    mut child: Child,
    mut stdin: ChildStdin,
    stdout: ChildStdout,
    input: Vec<u8>,
    events: mpsc::Sender<ChannelEvent>,
    mut kill_rx: oneshot::Receiver<()>,
) {
    let _ = events.send(ChannelEvent::Online).await;

    let io = async {
        // The worker may exit before reading its input; its exit status
        // tells the rest of the story.
        if let Err(e) = stdin.write_all(&input).await {
            tracing::trace!("Failed to write worker input: {e}");
        }
        drop(stdin);

        let mut reader = FrameReader::new(stdout);
        loop {
            match reader.read_frame().await {
                Ok(Some(WorkerFrame::Result { result })) => {
                    let _ = events.send(ChannelEvent::Message(result)).await;
                }
                Ok(Some(WorkerFrame::Error { message })) => {
                    let _ = events.send(ChannelEvent::Error(message)).await;
                }
                Ok(None) => break,
                Err(e) => {
                    let _ = events
                        .send(ChannelEvent::Error(format!("malformed worker output: {e}")))
                        .await;
                    break;
                }
            }
        }
        child.wait().await
    };

    let end = tokio::select! {
        status = io => PumpEnd::Exited(status),
        Ok(()) = &mut kill_rx => PumpEnd::Killed,
    };

    let status = match end {
        PumpEnd::Exited(status) => status,
        PumpEnd::Killed => {
            tracing::debug!(pid = ?child.id(), "Terminating extraction worker");
            let _ = child.start_kill();
            child.wait().await
        }
    };

    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            tracing::trace!("Failed to reap worker: {e}");
            None
        }
    };
    tracing::trace!(?code, "Worker process exited");
    let _ = events.send(ChannelEvent::Exited(code)).await;
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use typeweave_core::LayoutDescriptor;

    fn sh(script: &str) -> ProcessSpawner {
        ProcessSpawner::new(WorkerCommand::new("/bin/sh").arg("-c").arg(script))
    }

    fn input() -> WorkerInput {
        WorkerInput {
            layout: LayoutDescriptor::new(".").with_module("a.schema"),
        }
    }

    async fn collect(mut context: SpawnedContext) -> Vec<ChannelEvent> {
        let mut events = Vec::new();
        while let Some(event) = context.events.recv().await {
            events.push(event);
        }
        context.handle.detach();
        events
    }

    #[tokio::test]
    async fn test_event_order() {
        let spawner = sh(r#"cat >/dev/null; echo '{"kind":"error","message":"nope"}'; exit 1"#);
        let events = collect(spawner.spawn(&input()).unwrap()).await;
        assert_eq!(
            events,
            vec![
                ChannelEvent::Online,
                ChannelEvent::Error("nope".to_string()),
                ChannelEvent::Exited(Some(1)),
            ]
        );
    }

    #[tokio::test]
    async fn test_worker_receives_input_line() {
        let spawner = sh(
            r#"read line; case "$line" in *'"modules":["a.schema"]'*) echo '{"kind":"error","message":"got layout"}';; *) exit 9;; esac"#,
        );
        let events = collect(spawner.spawn(&input()).unwrap()).await;
        assert!(events.contains(&ChannelEvent::Error("got layout".to_string())));
    }

    #[tokio::test]
    async fn test_garbage_output_is_an_error_event() {
        let spawner = sh("cat >/dev/null; echo 'hello'");
        let events = collect(spawner.spawn(&input()).unwrap()).await;
        assert!(matches!(&events[1], ChannelEvent::Error(m) if m.contains("malformed worker output")));
        assert_eq!(events.last(), Some(&ChannelEvent::Exited(Some(0))));
    }

    #[tokio::test]
    async fn test_terminate_kills_worker() {
        let spawner = sh("sleep 30");
        let mut context = spawner.spawn(&input()).unwrap();
        assert_eq!(context.events.recv().await, Some(ChannelEvent::Online));

        context.handle.terminate();
        let exited = tokio::time::timeout(std::time::Duration::from_secs(10), context.events.recv())
            .await
            .unwrap();
        assert_eq!(exited, Some(ChannelEvent::Exited(None)));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let spawner = ProcessSpawner::new(WorkerCommand::new("/definitely/not/a/worker"));
        let err = spawner.spawn(&input()).unwrap_err();
        assert!(matches!(err, DispatchError::SpawnFailed { .. }));
    }
}
