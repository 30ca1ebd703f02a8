use super::broker::Broker;
use super::task_state::TaskStatus;
use crate::errors::ResultError;
use serde_json::Value;
use std::time::Duration;

/// Read-only reference to a submitted pipeline
#[derive(Debug, Clone)]
pub struct AsyncHandle {
    id: String,
    broker: Broker,
}

impl AsyncHandle {
    pub(crate) fn new(id: String, broker: Broker) -> Self {
        Self { id, broker }
    }

    /// Opaque submission identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn status(&self) -> Result<TaskStatus, ResultError> {
        self.broker.status(&self.id).await
    }

    /// Output of the final task, see [`Broker::result`]
    pub async fn result(&self) -> Result<Value, ResultError> {
        self.broker.result(&self.id).await
    }

    /// Polls until the submission finishes or `timeout` elapses
    ///
    /// # Errors
    /// * `ResultError::TimedOut` if the submission is still pending or running
    ///   at the deadline
    /// * any other error from [`AsyncHandle::result`]
    pub async fn wait(&self, poll_interval: Duration, timeout: Duration) -> Result<Value, ResultError> {
        tokio::time::timeout(timeout, async {
            loop {
                match self.result().await {
                    Err(ResultError::NotReady(_)) => tokio::time::sleep(poll_interval).await,
                    other => return other,
                }
            }
        })
        .await
        .map_err(|_| ResultError::TimedOut(timeout))?
    }
}
