//! Dispatching tasks to isolated workers.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use mender_codemod::CodemodTaskResult;
use tracing::{debug, info};

use crate::error::TaskError;
use crate::input::TaskInput;
use crate::protocol::ReplyError;
use crate::transport::TransportFactory;

const DISPATCH_TARGET: &str = "mender_task::dispatch";

/// Runs each task in a fresh worker obtained from a [`TransportFactory`].
#[derive(Debug)]
pub struct WorkerDispatcher<F> {
    factory: F,
}

impl<F: TransportFactory> WorkerDispatcher<F> {
    /// Creates a dispatcher that opens workers through `factory`.
    #[must_use]
    pub const fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Runs one task in its own worker.
    ///
    /// The transport is closed even when sending or receiving fails.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Worker`] if the worker reports a failure, or the
    /// transport and protocol errors met on the way.
    pub fn dispatch(&self, input: &TaskInput) -> Result<CodemodTaskResult, TaskError> {
        let mut transport = self.factory.create(input)?;
        let exchanged = transport.send(input).and_then(|()| transport.receive());
        let closed = transport.close();
        let reply = exchanged?;
        closed?;

        reply.into_result().map_err(|err| match err {
            ReplyError::Failed(error) => TaskError::worker(&input.input_file_path, error),
            ReplyError::Malformed(message) => TaskError::protocol(message),
        })
    }

    /// Runs every task, at most `workers` at a time, on scoped threads.
    ///
    /// Results are returned in input order.
    pub fn dispatch_all(
        &self,
        inputs: &[TaskInput],
        workers: NonZeroUsize,
    ) -> Vec<Result<CodemodTaskResult, TaskError>> {
        let next = AtomicUsize::new(0);
        let threads = workers.get().min(inputs.len());
        info!(
            target: DISPATCH_TARGET,
            files = inputs.len(),
            threads,
            "dispatching tasks"
        );

        let mut finished: Vec<(usize, Result<CodemodTaskResult, TaskError>)> =
            thread::scope(|scope| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        scope.spawn(|| {
                            let mut done = Vec::new();
                            loop {
                                let index = next.fetch_add(1, Ordering::Relaxed);
                                let Some(input) = inputs.get(index) else {
                                    break;
                                };
                                debug!(
                                    target: DISPATCH_TARGET,
                                    path = %input.input_file_path.display(),
                                    "dispatching task"
                                );
                                done.push((index, self.dispatch(input)));
                            }
                            done
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .flat_map(|handle| {
                        handle
                            .join()
                            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                    })
                    .collect()
            });

        finished.sort_by_key(|(index, _)| *index);
        finished.into_iter().map(|(_, result)| result).collect()
    }
}
