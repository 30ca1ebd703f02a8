/// Worker and janitor loops
mod worker;

use super::backend::{ResultBackend, SubmissionRecord};
use super::chain::Pipeline;
use super::handle::AsyncHandle;
use super::task_state::{TaskFailure, TaskStatus};
use crate::config::BrokerConfig;
use crate::constants::BROKER_TASK_NAME;
use crate::errors::{BrokerError, ResultError};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

/// A pipeline waiting in the queue together with its `PENDING` record
#[derive(Debug)]
pub(crate) struct Job {
    record: SubmissionRecord,
    pipeline: Pipeline,
}

/// In-process broker feeding a pool of tokio workers.
///
/// Cloning is cheap; every clone shares the same queue and result backend.
/// Workers stop once every clone has been dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct Broker {
    queue: UnboundedSender<Job>,
    backend: Arc<dyn ResultBackend>,
}

impl Broker {
    /// Spawns the worker pool and, when results expire, the janitor.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(backend: Arc<dyn ResultBackend>, config: &BrokerConfig) -> Self {
        let (queue, rx) = unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));
        let workers = config.workers.max(1);

        for index in 0..workers {
            tokio::spawn(worker::run_worker(
                index,
                Arc::clone(&rx),
                Arc::clone(&backend),
            ));
        }

        if let Some(expires) = config.result_expires {
            tokio::spawn(worker::run_janitor(
                Arc::clone(&backend),
                expires,
                config.cleanup_interval,
            ));
        }

        info!("Broker started with {} workers", workers);
        Self { queue, backend }
    }

    /// Records the submission as `PENDING` and enqueues it.
    ///
    /// Returns as soon as the pipeline is queued; execution errors are only
    /// visible through the returned handle. When the queue is closed the
    /// recorded submission is marked `FAILURE`.
    pub async fn submit(&self, pipeline: Pipeline) -> Result<AsyncHandle, BrokerError> {
        let id = Uuid::new_v4().to_string();
        let record = SubmissionRecord::pending(&id);
        self.backend.store(&record).await?;

        debug!("[{}] Submitting chain {}", id, pipeline.task_names().join(" -> "));
        if let Err(SendError(job)) = self.queue.send(Job { record, pipeline }) {
            let mut record = job.record;
            record.mark_failure(TaskFailure::new(
                BROKER_TASK_NAME,
                BrokerError::QueueClosed.to_string(),
            ));
            if let Err(e) = self.backend.store(&record).await {
                error!("[{}] Failed to store FAILURE state: {}", id, e);
            }
            return Err(BrokerError::QueueClosed);
        }

        Ok(AsyncHandle::new(id, self.clone()))
    }

    /// Rebuilds a handle for a submission id received from a caller
    pub async fn handle(&self, id: &str) -> Result<AsyncHandle, ResultError> {
        self.record(id).await?;
        Ok(AsyncHandle::new(id.to_string(), self.clone()))
    }

    pub async fn status(&self, id: &str) -> Result<TaskStatus, ResultError> {
        Ok(self.record(id).await?.status)
    }

    /// Output of the last step of a successful submission
    ///
    /// # Errors
    /// * `ResultError::NotReady` while the submission is pending or running
    /// * `ResultError::TaskFailed` with the failing step when it failed
    pub async fn result(&self, id: &str) -> Result<Value, ResultError> {
        let record = self.record(id).await?;
        match record.status {
            TaskStatus::Success => Ok(record.result.unwrap_or(Value::Null)),
            TaskStatus::Failure => Err(ResultError::TaskFailed(
                record
                    .failure
                    .unwrap_or_else(|| TaskFailure::new("unknown", "no failure recorded")),
            )),
            status => Err(ResultError::NotReady(status)),
        }
    }

    async fn record(&self, id: &str) -> Result<SubmissionRecord, ResultError> {
        self.backend
            .fetch(id)
            .await?
            .ok_or_else(|| ResultError::UnknownSubmission(id.to_string()))
    }
}
