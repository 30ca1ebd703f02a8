use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a submitted pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Accepted by the broker, waiting for a free worker
    Pending,
    /// A worker is executing the pipeline
    Running,
    /// Every step completed, the last step's output is available
    Success,
    /// A step failed and the chain was stopped
    Failure,
}

impl TaskStatus {
    /// Whether the submission reached a terminal state
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failure)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Success => "SUCCESS",
            TaskStatus::Failure => "FAILURE",
        };
        f.write_str(s)
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    /// Parses the representation produced by `Display`
    ///
    /// # Returns
    /// * `Ok(TaskStatus)` if the string matches a valid status
    /// * `Err(())` otherwise
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TaskStatus::Pending),
            "RUNNING" => Ok(TaskStatus::Running),
            "SUCCESS" => Ok(TaskStatus::Success),
            "FAILURE" => Ok(TaskStatus::Failure),
            _ => Err(()),
        }
    }
}

/// Failure of a single step, carried unchanged up to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    /// Name of the task that failed
    pub task: String,
    /// Reason reported by the task
    pub reason: String,
}

impl TaskFailure {
    pub fn new(task: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task '{}' failed: {}", self.task, self.reason)
    }
}
