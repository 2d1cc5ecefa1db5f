//! Background replication worker
//!
//! The executor runs on its own thread; progress and the final result travel
//! back over a channel so the caller's thread never blocks on file I/O.

use crate::corpus::scanner::CorpusScanner;
use crate::io::configuration::WORKER_THREAD_NAME;
use crate::io::error::{ReplicationError, Result};
use crate::replication::executor::{CancelToken, CopyResult, ProgressSink, ReplicationJob, execute};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::thread::{self, JoinHandle};

/// Message sent from the worker thread
#[derive(Debug)]
pub enum WorkerEvent {
    /// One file finished
    Progress {
        /// Percentage of files done
        percent: f64,
        /// Human-readable status for the file
        message: String,
    },
    /// The run ended; always the last event
    Finished(Result<CopyResult>),
}

struct ChannelSink {
    sender: Sender<WorkerEvent>,
}

impl ProgressSink for ChannelSink {
    fn report(&mut self, percent: f64, message: &str) {
        // A dropped receiver only means nobody is watching progress any more
        let _ = self.sender.send(WorkerEvent::Progress {
            percent,
            message: message.to_string(),
        });
    }
}

/// Handle to a replication running on a background thread
pub struct ReplicationWorker {
    events: Receiver<WorkerEvent>,
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

impl ReplicationWorker {
    /// Start replicating `scanner`'s corpus according to `job`
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned
    pub fn spawn(scanner: CorpusScanner, job: ReplicationJob) -> Result<Self> {
        let (sender, events) = unbounded();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let mut sink = ChannelSink {
                    sender: sender.clone(),
                };
                let result = execute(&scanner, &job, &worker_cancel, &mut sink);
                let _ = sender.send(WorkerEvent::Finished(result));
            })
            .map_err(|e| ReplicationError::Worker {
                reason: format!("failed to spawn worker thread: {e}"),
            })?;

        Ok(Self {
            events,
            cancel,
            handle,
        })
    }

    /// Token that stops the worker after its current file
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Block until the run ends, forwarding progress to `progress`
    ///
    /// # Errors
    ///
    /// Returns the executor's error, or [`ReplicationError::Worker`] if the
    /// thread ended without reporting a result
    pub fn wait(self, progress: &mut impl ProgressSink) -> Result<CopyResult> {
        let mut outcome = None;
        for event in &self.events {
            match event {
                WorkerEvent::Progress { percent, message } => progress.report(percent, &message),
                WorkerEvent::Finished(result) => {
                    outcome = Some(result);
                    break;
                }
            }
        }

        let joined = self.handle.join();
        match (outcome, joined) {
            (Some(result), _) => result,
            (None, Err(_panic)) => Err(ReplicationError::Worker {
                reason: "worker thread panicked".to_string(),
            }),
            (None, Ok(())) => Err(ReplicationError::Worker {
                reason: "worker exited without a result".to_string(),
            }),
        }
    }
}
