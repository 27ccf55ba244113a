//! Bounded worker pool for conversion jobs
//!
//! The tree walker submits jobs through a [`JobSender`]; a dispatcher task
//! pulls them off an unbounded channel and runs each on its own tokio task,
//! holding one of `workers` semaphore permits for the job's lifetime.
//! [`ConversionScheduler::shutdown`] is the join barrier: it closes the
//! queue and waits for every submitted job to finish.
//!
//! Jobs are independent. A failed or panicking job is counted and logged;
//! it never stops the dispatcher or its siblings.

use crate::models::{ConversionJob, JobOutcome, SyncReport, SyncStats};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error};

/// Work performed for one job
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn handle(&self, job: ConversionJob) -> JobOutcome;
}

/// Submission handle given to the tree walker
#[derive(Clone)]
pub struct JobSender {
    tx: mpsc::UnboundedSender<ConversionJob>,
    stats: Arc<SyncStats>,
}

impl JobSender {
    pub(crate) fn channel(stats: Arc<SyncStats>) -> (Self, mpsc::UnboundedReceiver<ConversionJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, stats }, rx)
    }

    /// Queue a job; returns `false` if the scheduler has already stopped
    pub fn submit(&self, job: ConversionJob) -> bool {
        match self.tx.send(job) {
            Ok(()) => {
                self.stats.record_submitted();
                true
            }
            Err(mpsc::error::SendError(job)) => {
                error!(source = %job.source.display(), "Scheduler stopped, job dropped");
                false
            }
        }
    }

    pub fn stats(&self) -> &Arc<SyncStats> {
        &self.stats
    }
}

/// Worker pool with an explicit start and join
pub struct ConversionScheduler {
    sender: JobSender,
    dispatcher: JoinHandle<()>,
    stats: Arc<SyncStats>,
}

impl ConversionScheduler {
    /// Start the dispatcher with `workers` concurrent slots (at least one)
    pub fn start<H: JobHandler>(handler: Arc<H>, workers: usize, stats: Arc<SyncStats>) -> Self {
        let (sender, rx) = JobSender::channel(Arc::clone(&stats));
        let workers = workers.max(1);

        debug!(workers, "Starting conversion scheduler");

        let dispatcher = tokio::spawn(dispatch(rx, handler, workers, Arc::clone(&stats)));

        Self {
            sender,
            dispatcher,
            stats,
        }
    }

    pub fn sender(&self) -> JobSender {
        self.sender.clone()
    }

    /// Close the queue and wait for every submitted job
    ///
    /// Senders handed out by [`sender`](Self::sender) must be dropped first,
    /// otherwise this waits for them.
    pub async fn shutdown(self) -> SyncReport {
        let Self {
            sender,
            dispatcher,
            stats,
        } = self;
        drop(sender);

        if let Err(e) = dispatcher.await {
            error!("Scheduler dispatcher failed: {}", e);
        }

        stats.snapshot()
    }
}

async fn dispatch<H: JobHandler>(
    mut rx: mpsc::UnboundedReceiver<ConversionJob>,
    handler: Arc<H>,
    workers: usize,
    stats: Arc<SyncStats>,
) {
    let slots = Arc::new(Semaphore::new(workers));
    let mut running: JoinSet<JobOutcome> = JoinSet::new();

    loop {
        tokio::select! {
            job = rx.recv() => {
                let Some(job) = job else { break };

                // Never closed
                let permit = match Arc::clone(&slots).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        error!("Worker pool closed: {}", e);
                        break;
                    }
                };

                let handler = Arc::clone(&handler);
                running.spawn(async move {
                    let _permit = permit;
                    handler.handle(job).await
                });
            }
            Some(joined) = running.join_next(), if !running.is_empty() => {
                record_joined(&stats, joined);
            }
        }
    }

    while let Some(joined) = running.join_next().await {
        record_joined(&stats, joined);
    }
}

fn record_joined(stats: &SyncStats, joined: Result<JobOutcome, JoinError>) {
    match joined {
        Ok(outcome) => stats.record_outcome(outcome),
        Err(e) => {
            error!("Job task failed: {}", e);
            stats.record_outcome(JobOutcome::Failed);
        }
    }
}
