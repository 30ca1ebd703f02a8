use super::{format_timestamp, Database, Submission, SubmissionRepository};
use crate::core::{ResultBackend, SubmissionRecord};
use crate::errors::Error;
use chrono::{DateTime, Utc};
use tokio::task::spawn_blocking;

/// Result backend persisting submissions with diesel.
///
/// Diesel is blocking, every call runs on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    database: Database,
}

impl SqliteBackend {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Opens the SQLite file at `path`
    pub fn open(path: &str) -> Result<Self, Error> {
        Ok(Self::new(Database::new(path)?))
    }
}

#[async_trait::async_trait]
impl ResultBackend for SqliteBackend {
    async fn store(&self, record: &SubmissionRecord) -> Result<(), Error> {
        let row = Submission::from_record(record)?;
        let database = self.database.clone();
        spawn_blocking(move || {
            let mut conn = database.get_conn()?;
            SubmissionRepository::new(&mut conn).upsert(&row)
        })
        .await?
    }

    async fn fetch(&self, id: &str) -> Result<Option<SubmissionRecord>, Error> {
        let id = id.to_string();
        let database = self.database.clone();
        let row = spawn_blocking(move || {
            let mut conn = database.get_conn()?;
            SubmissionRepository::new(&mut conn).get(&id)
        })
        .await??;
        row.map(Submission::into_record).transpose()
    }

    async fn purge_finished_before(&self, cutoff: DateTime<Utc>) -> Result<usize, Error> {
        let cutoff = format_timestamp(&cutoff);
        let database = self.database.clone();
        spawn_blocking(move || {
            let mut conn = database.get_conn()?;
            SubmissionRepository::new(&mut conn).delete_finished_before(&cutoff)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TaskFailure, TaskStatus};
    use chrono::Duration;
    use serde_json::json;

    fn backend() -> SqliteBackend {
        SqliteBackend::new(Database::with_pool_size(":memory:", 1).unwrap())
    }

    #[tokio::test]
    async fn records_survive_a_round_trip() {
        let backend = backend();
        let mut record = SubmissionRecord::pending("s1");
        backend.store(&record).await.unwrap();
        assert_eq!(
            backend.fetch("s1").await.unwrap().unwrap().status,
            TaskStatus::Pending
        );

        record.mark_running();
        record.mark_success(json!({ "model": "seq2seq", "epochs": [1, 2] }));
        backend.store(&record).await.unwrap();

        let loaded = backend.fetch("s1").await.unwrap().unwrap();
        assert_eq!(loaded.status, TaskStatus::Success);
        assert_eq!(loaded.result, record.result);
        assert_eq!(loaded.failure, None);
        assert_eq!(
            format_timestamp(&loaded.created_at),
            format_timestamp(&record.created_at)
        );
    }

    #[tokio::test]
    async fn failures_are_stored() {
        let backend = backend();
        let mut record = SubmissionRecord::pending("s2");
        record.mark_failure(TaskFailure::new("TrainTask", "exit status 1"));
        backend.store(&record).await.unwrap();

        let loaded = backend.fetch("s2").await.unwrap().unwrap();
        assert_eq!(loaded.status, TaskStatus::Failure);
        assert_eq!(
            loaded.failure,
            Some(TaskFailure::new("TrainTask", "exit status 1"))
        );
    }

    #[tokio::test]
    async fn unknown_id_is_none() {
        assert!(backend().fetch("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purge_only_drops_finished_rows() {
        let backend = backend();
        let mut done = SubmissionRecord::pending("done");
        done.mark_failure(TaskFailure::new("A", "x"));
        backend.store(&done).await.unwrap();
        backend
            .store(&SubmissionRecord::pending("waiting"))
            .await
            .unwrap();

        let purged = backend
            .purge_finished_before(Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(purged, 1);
        assert!(backend.fetch("done").await.unwrap().is_none());
        assert!(backend.fetch("waiting").await.unwrap().is_some());
    }

    #[test]
    fn corrupt_status_is_reported() {
        let row = Submission {
            id: "x".into(),
            status: "DONE".into(),
            result: None,
            failed_task: None,
            failure_reason: None,
            created_at: format_timestamp(&Utc::now()),
            updated_at: format_timestamp(&Utc::now()),
        };
        assert!(matches!(row.into_record(), Err(Error::CorruptRecord(_))));
    }
}
