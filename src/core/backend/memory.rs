use super::{ResultBackend, SubmissionRecord};
use crate::errors::Error;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local result backend
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    records: RwLock<HashMap<String, SubmissionRecord>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ResultBackend for InMemoryBackend {
    async fn store(&self, record: &SubmissionRecord) -> Result<(), Error> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn fetch(&self, id: &str) -> Result<Option<SubmissionRecord>, Error> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn purge_finished_before(&self, cutoff: DateTime<Utc>) -> Result<usize, Error> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| !(r.status.is_finished() && r.updated_at < cutoff));
        Ok(before - records.len())
    }
}
