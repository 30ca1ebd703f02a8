use crate::core::{SubmissionRecord, TaskFailure, TaskStatus};
use crate::errors::Error;
use crate::schema::submissions;
use chrono::{DateTime, SecondsFormat, Utc};
use diesel::{Insertable, Queryable};
use serde_json::Value;

/// Row of the `submissions` table
#[derive(Debug, Clone, PartialEq, Queryable, Insertable)]
#[diesel(table_name = submissions)]
pub struct Submission {
    /// Submission identifier handed to the caller
    pub id: String,
    /// `PENDING`, `RUNNING`, `SUCCESS` or `FAILURE`
    pub status: String,
    /// JSON serialized output of the last step
    pub result: Option<String>,
    /// Name of the failing task
    pub failed_task: Option<String>,
    /// Reason reported by the failing task
    pub failure_reason: Option<String>,
    /// RFC 3339 UTC timestamp of the submission
    pub created_at: String,
    /// RFC 3339 UTC timestamp of the last state change
    pub updated_at: String,
}

/// Fixed-width UTC timestamps so that text comparison follows time order
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::CorruptRecord(format!("bad timestamp '{}': {}", s, e)))
}

impl Submission {
    pub fn from_record(record: &SubmissionRecord) -> Result<Self, Error> {
        Ok(Self {
            id: record.id.clone(),
            status: record.status.to_string(),
            result: record
                .result
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            failed_task: record.failure.as_ref().map(|f| f.task.clone()),
            failure_reason: record.failure.as_ref().map(|f| f.reason.clone()),
            created_at: format_timestamp(&record.created_at),
            updated_at: format_timestamp(&record.updated_at),
        })
    }

    pub fn into_record(self) -> Result<SubmissionRecord, Error> {
        let status: TaskStatus = self
            .status
            .parse()
            .map_err(|_| Error::CorruptRecord(format!("unknown status '{}'", self.status)))?;
        let result: Option<Value> = self
            .result
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let failure = match (self.failed_task, self.failure_reason) {
            (Some(task), Some(reason)) => Some(TaskFailure { task, reason }),
            (None, None) => None,
            _ => {
                return Err(Error::CorruptRecord(format!(
                    "submission {} has a partial failure",
                    self.id
                )))
            }
        };

        Ok(SubmissionRecord {
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            id: self.id,
            status,
            result,
            failure,
        })
    }
}
