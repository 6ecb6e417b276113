//! Channels between the dispatcher and its workers.
//!
//! [`ProcessTransport`] spawns the worker as a child process, writes the
//! request to its stdin as a single JSON line, closes stdin and reads one
//! reply line from stdout. Stderr is drained into the log by a background
//! thread for the whole life of the worker, so a chatty worker never blocks
//! on a full pipe while the dispatcher waits for its reply.

use std::ffi::OsString;
use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::TaskError;
use crate::input::TaskInput;
use crate::protocol::WorkerReply;

const TRANSPORT_TARGET: &str = "mender_task::transport";

/// A request/reply channel to one worker.
pub trait WorkerTransport: Send {
    /// Sends the request.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Transport`] if the request cannot be delivered.
    fn send(&mut self, input: &TaskInput) -> Result<(), TaskError>;

    /// Waits for the reply.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Transport`] if the channel fails, or
    /// [`TaskError::Protocol`] if the worker answers with something that is
    /// not a reply.
    fn receive(&mut self) -> Result<WorkerReply, TaskError>;

    /// Releases the worker.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Transport`] if the worker did not shut down
    /// cleanly.
    fn close(&mut self) -> Result<(), TaskError>;
}

/// Creates one transport per file.
pub trait TransportFactory: Send + Sync {
    /// Opens a transport for the task described by `input`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Transport`] if no worker can be started.
    fn create(&self, input: &TaskInput) -> Result<Box<dyn WorkerTransport>, TaskError>;
}

impl<F> TransportFactory for F
where
    F: Fn(&TaskInput) -> Result<Box<dyn WorkerTransport>, TaskError> + Send + Sync,
{
    fn create(&self, input: &TaskInput) -> Result<Box<dyn WorkerTransport>, TaskError> {
        self(input)
    }
}

/// Starts workers as child processes of a fixed command.
#[derive(Debug, Clone)]
pub struct ProcessTransportFactory {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessTransportFactory {
    /// Runs `program` with `args` for every file.
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the worker program.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl TransportFactory for ProcessTransportFactory {
    fn create(&self, input: &TaskInput) -> Result<Box<dyn WorkerTransport>, TaskError> {
        debug!(
            target: TRANSPORT_TARGET,
            program = %self.program.display(),
            path = %input.input_file_path.display(),
            "spawning worker process"
        );
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let transport = ProcessTransport::spawn(command)?;
        Ok(Box::new(transport))
    }
}

/// A worker running as a child process.
pub struct ProcessTransport {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    stderr_drain: Option<JoinHandle<()>>,
    closed: bool,
}

impl fmt::Debug for ProcessTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessTransport")
            .field("pid", &self.child.id())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl ProcessTransport {
    /// Spawns `command`, which must pipe stdin and stdout.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Transport`] if the process cannot be started or
    /// its pipes are missing.
    pub fn spawn(mut command: Command) -> Result<Self, TaskError> {
        let mut child = command
            .spawn()
            .map_err(|err| TaskError::transport("failed to start worker process", err))?;
        let stdin = child.stdin.take();
        let Some(stdout) = child.stdout.take() else {
            drop(child.kill());
            drop(child.wait());
            return Err(TaskError::Transport {
                message: "failed to capture worker stdout".to_owned(),
                source: None,
            });
        };
        let pid = child.id();
        let stderr_drain = child
            .stderr
            .take()
            .map(|pipe| thread::spawn(move || forward_stderr(pid, pipe)));
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            stderr_drain,
            closed: false,
        })
    }

    fn join_stderr_drain(&mut self) {
        let Some(handle) = self.stderr_drain.take() else {
            return;
        };
        if handle.join().is_err() {
            warn!(
                target: TRANSPORT_TARGET,
                pid = self.child.id(),
                "worker stderr reader panicked"
            );
        }
    }
}

/// Logs each stderr line of worker `pid` until the pipe closes.
fn forward_stderr(pid: u32, pipe: ChildStderr) {
    for line in BufReader::new(pipe).lines() {
        match line {
            Ok(text) if text.trim().is_empty() => {}
            Ok(text) => debug!(target: TRANSPORT_TARGET, pid, stderr = %text, "worker stderr"),
            Err(err) => {
                debug!(target: TRANSPORT_TARGET, pid, error = %err, "stopped reading worker stderr");
                break;
            }
        }
    }
}

impl WorkerTransport for ProcessTransport {
    fn send(&mut self, input: &TaskInput) -> Result<(), TaskError> {
        let mut stdin = self.stdin.take().ok_or_else(|| TaskError::Transport {
            message: "worker request was already sent".to_owned(),
            source: None,
        })?;
        let payload = serde_json::to_string(input).map_err(|err| TaskError::Transport {
            message: format!("failed to serialise worker request: {err}"),
            source: None,
        })?;
        stdin
            .write_all(payload.as_bytes())
            .and_then(|()| stdin.write_all(b"\n"))
            .and_then(|()| stdin.flush())
            .map_err(|err| TaskError::transport("failed to write worker request", err))
        // Dropping stdin closes the pipe, telling the worker no more input follows.
    }

    fn receive(&mut self) -> Result<WorkerReply, TaskError> {
        let mut line = String::new();
        let bytes_read = self
            .stdout
            .read_line(&mut line)
            .map_err(|err| TaskError::transport("failed to read worker reply", err))?;
        if bytes_read == 0 {
            return Err(TaskError::protocol("worker exited without replying"));
        }
        WorkerReply::parse(&line)
    }

    fn close(&mut self) -> Result<(), TaskError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stdin = None;
        let waited = self.child.wait();
        self.join_stderr_drain();
        let status =
            waited.map_err(|err| TaskError::transport("failed to wait for worker", err))?;
        debug!(target: TRANSPORT_TARGET, pid = self.child.id(), ?status, "worker exited");
        if status.success() {
            Ok(())
        } else {
            Err(TaskError::Transport {
                message: format!("worker exited with {status}"),
                source: None,
            })
        }
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Ok(None) = self.child.try_wait() {
            warn!(
                target: TRANSPORT_TARGET,
                pid = self.child.id(),
                "killing worker that was not closed"
            );
            drop(self.child.kill());
        }
        drop(self.child.wait());
    }
}
