//! Background resummarization.
//!
//! The chat path never waits on a summary refresh: after a reply is
//! persisted it drops a [`SummaryJob`] on the [`SummaryQueue`] and returns.
//! The worker task waits a short delay, then loads the latest transcript,
//! asks the model for a new summary, and refreshes the system message.
//! Failures stop at the job boundary and are only logged.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::context::store::ContextStore;
use crate::storage::kv_store::KvStore;

/// Delay between a reply being persisted and its summary refresh.
pub const DEFAULT_SUMMARY_DELAY: Duration = Duration::from_millis(500);

/// A request to refresh one user's summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryJob {
    pub user_id: String,
}

/// Sending half of the worker's job channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SummaryQueue {
    tx: mpsc::UnboundedSender<SummaryJob>,
}

impl SummaryQueue {
    /// Schedule a refresh. A stopped worker drops the job with a warning.
    pub fn enqueue(&self, user_id: &str) {
        let job = SummaryJob {
            user_id: user_id.to_string(),
        };
        if self.tx.send(job).is_err() {
            warn!(user_id, "summary worker stopped, dropping job");
        }
    }
}

/// Handle to the running worker task.
pub struct SummaryWorker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl SummaryWorker {
    /// Start the worker on the current tokio runtime.
    pub fn spawn<S: KvStore + 'static>(
        contexts: Arc<ContextStore<S>>,
        delay: Duration,
    ) -> (SummaryQueue, SummaryWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(contexts, rx, delay, cancel.clone()));
        (SummaryQueue { tx }, SummaryWorker { handle, cancel })
    }

    /// Stop accepting jobs, finish everything already queued, and wait.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "summary worker task failed");
        }
    }
}

async fn run<S: KvStore + 'static>(
    contexts: Arc<ContextStore<S>>,
    mut rx: mpsc::UnboundedReceiver<SummaryJob>,
    delay: Duration,
    cancel: CancellationToken,
) {
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            job = rx.recv() => match job {
                Some(job) => {
                    in_flight.spawn(process(contexts.clone(), job, delay));
                }
                None => break,
            },
            Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = result {
                    warn!(error = %e, "summary job panicked");
                }
            }
        }
    }

    // Drain: anything already queued still runs.
    rx.close();
    while let Some(job) = rx.recv().await {
        in_flight.spawn(process(contexts.clone(), job, delay));
    }
    while let Some(result) = in_flight.join_next().await {
        if let Err(e) = result {
            warn!(error = %e, "summary job panicked");
        }
    }
    debug!("summary worker stopped");
}

async fn process<S: KvStore + 'static>(
    contexts: Arc<ContextStore<S>>,
    job: SummaryJob,
    delay: Duration,
) {
    tokio::time::sleep(delay).await;

    let user_id = job.user_id.as_str();
    let transcript = contexts.load(user_id).await;
    match contexts.summaries().resummarize(user_id, &transcript).await {
        Ok(Some(_)) => {
            contexts.refresh_from_store(user_id).await;
            info!(user_id, "background summary applied");
        }
        Ok(None) => {}
        Err(e) => {
            warn!(user_id, error = %e, "background resummarization failed");
        }
    }
}
