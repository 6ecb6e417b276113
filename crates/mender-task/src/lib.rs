//! Single-file migration tasks and the worker protocol that isolates them.
//!
//! A [`CodemodTask`] reads one file through the injected
//! [`FileSystem`](mender_codemod::FileSystem), runs a codemod over it and
//! writes the result back unless the [`TaskInput`] asks for a dry run. Tasks
//! run in-process ([`CodemodTask::run_from_env`]) or inside a worker: the
//! [`WorkerDispatcher`] sends one JSON line per file over a
//! [`WorkerTransport`] and the worker answers through [`worker::serve`].

mod dispatch;
mod error;
mod input;
mod protocol;
mod task;
mod transport;
pub mod worker;

#[cfg(test)]
mod tests;

pub use dispatch::WorkerDispatcher;
pub use error::TaskError;
pub use input::{
    APPLY_DANGEROUS_EDITS_VAR, DRY_RUN_VAR, INPUT_FILE_VAR, TaskInput, flag_enabled,
};
pub use protocol::{ReplyError, SerializedError, WorkerReply};
pub use task::{CodemodTask, RunnerEnv};
pub use transport::{ProcessTransport, ProcessTransportFactory, TransportFactory, WorkerTransport};
