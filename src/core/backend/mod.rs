mod memory;

use super::task_state::{TaskFailure, TaskStatus};
use crate::errors::Error;
use chrono::{DateTime, Utc};
use serde_json::Value;

pub use memory::InMemoryBackend;

/// State of one submission as kept by a result backend
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    /// Identifier handed to the caller
    pub id: String,
    /// Current lifecycle state
    pub status: TaskStatus,
    /// Output of the last step, set on success
    pub result: Option<Value>,
    /// Failing step and reason, set on failure
    pub failure: Option<TaskFailure>,
    /// When the broker accepted the submission
    pub created_at: DateTime<Utc>,
    /// Last state transition
    pub updated_at: DateTime<Utc>,
}

impl SubmissionRecord {
    /// Creates a fresh `PENDING` record
    pub fn pending(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: TaskStatus::Pending,
            result: None,
            failure: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = TaskStatus::Running;
        self.updated_at = Utc::now();
    }

    pub fn mark_success(&mut self, result: Value) {
        self.status = TaskStatus::Success;
        self.result = Some(result);
        self.updated_at = Utc::now();
    }

    pub fn mark_failure(&mut self, failure: TaskFailure) {
        self.status = TaskStatus::Failure;
        self.failure = Some(failure);
        self.updated_at = Utc::now();
    }
}

/// Storage for submission states and results.
///
/// Workers write through it, handles read through it.
#[async_trait::async_trait]
pub trait ResultBackend: std::fmt::Debug + Send + Sync {
    /// Inserts or replaces a record
    async fn store(&self, record: &SubmissionRecord) -> Result<(), Error>;

    /// Loads a record, `None` if unknown or already purged
    async fn fetch(&self, id: &str) -> Result<Option<SubmissionRecord>, Error>;

    /// Deletes finished records last updated before `cutoff`
    ///
    /// # Returns
    /// * Number of deleted records
    async fn purge_finished_before(&self, cutoff: DateTime<Utc>) -> Result<usize, Error>;
}
