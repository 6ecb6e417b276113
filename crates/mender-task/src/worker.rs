//! The worker side of the protocol.
//!
//! A worker handles exactly one request: it reads one JSON line, validates
//! it, runs the task and writes one reply line. Failures of the task itself
//! are answered with a failure reply; only a broken output channel is
//! returned to the caller.

use std::io::{BufRead, Write};

use mender_codemod::Codemod;
use tracing::{debug, warn};

use crate::error::TaskError;
use crate::input::TaskInput;
use crate::protocol::{SerializedError, WorkerReply};
use crate::task::{CodemodTask, RunnerEnv};

const WORKER_TARGET: &str = "mender_task::worker";

/// Serves one request from `reader`, answering on `writer`.
///
/// # Errors
///
/// Returns [`TaskError::Transport`] if the reply cannot be serialised or
/// written.
pub fn serve<C: Codemod>(
    task: &CodemodTask<C>,
    env: &RunnerEnv<'_>,
    reader: &mut impl BufRead,
    writer: &mut impl Write,
) -> Result<(), TaskError> {
    let outcome = read_request(reader).and_then(|input| {
        debug!(
            target: WORKER_TARGET,
            path = %input.input_file_path.display(),
            dry_run = input.dry_run,
            "handling worker request"
        );
        task.run(&input, env)
    });

    let reply = match outcome {
        Ok(result) => WorkerReply::success(result),
        Err(err) => {
            warn!(target: WORKER_TARGET, error = %err, "worker request failed");
            WorkerReply::failure(SerializedError::from(&err))
        }
    };
    write_reply(writer, &reply)
}

fn read_request(reader: &mut impl BufRead) -> Result<TaskInput, TaskError> {
    let mut line = String::new();
    let bytes_read = reader
        .read_line(&mut line)
        .map_err(|err| TaskError::transport("failed to read worker request", err))?;
    if bytes_read == 0 {
        return Err(TaskError::invalid_input("worker request was empty"));
    }
    TaskInput::from_message(&line)
}

fn write_reply(writer: &mut impl Write, reply: &WorkerReply) -> Result<(), TaskError> {
    let payload = serde_json::to_string(reply).map_err(|err| TaskError::Transport {
        message: format!("failed to serialise worker reply: {err}"),
        source: None,
    })?;
    writer
        .write_all(payload.as_bytes())
        .and_then(|()| writer.write_all(b"\n"))
        .and_then(|()| writer.flush())
        .map_err(|err| TaskError::transport("failed to write worker reply", err))
}
