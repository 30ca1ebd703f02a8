use super::Job;
use crate::constants::{BROKER_TASK_NAME, FINAL_STORE_ATTEMPTS, FINAL_STORE_RETRY_DELAY};
use crate::core::backend::{ResultBackend, SubmissionRecord};
use crate::core::TaskFailure;
use crate::errors::Error;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Pulls jobs off the shared queue until every sender is dropped
pub(super) async fn run_worker(
    index: usize,
    queue: Arc<Mutex<UnboundedReceiver<Job>>>,
    backend: Arc<dyn ResultBackend>,
) {
    debug!("Worker {} started", index);
    loop {
        let job = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let Some(job) = job else {
            break;
        };
        process_job(index, job, backend.as_ref()).await;
    }
    debug!("Worker {} stopped", index);
}

async fn process_job(index: usize, job: Job, backend: &dyn ResultBackend) {
    let Job { mut record, pipeline } = job;
    let id = record.id.clone();

    info!(
        "[{}] Worker {} running chain {}",
        id,
        index,
        pipeline.task_names().join(" -> ")
    );
    record.mark_running();
    if let Err(e) = backend.store(&record).await {
        warn!("[{}] Failed to store RUNNING state: {}", id, e);
    }

    match pipeline.execute(&id).await {
        Ok(result) => {
            info!("[{}] Chain succeeded", id);
            record.mark_success(result);
        }
        Err(failure) => {
            error!("[{}] Chain stopped: {}", id, failure);
            record.mark_failure(failure);
        }
    }
    persist_final(backend, record).await;
}

/// Stores the final state of a submission.
///
/// A final state that cannot be stored is replaced by a `FAILURE` naming the
/// backend error, so that pollers never see the submission stuck in `RUNNING`.
async fn persist_final(backend: &dyn ResultBackend, mut record: SubmissionRecord) {
    let Err(e) = store_with_retry(backend, &record).await else {
        return;
    };
    error!(
        "[{}] Failed to store {} state: {}",
        record.id, record.status, e
    );

    record.result = None;
    record.mark_failure(TaskFailure::new(
        BROKER_TASK_NAME,
        format!("result could not be stored: {}", e),
    ));
    if let Err(e) = store_with_retry(backend, &record).await {
        error!("[{}] Failed to store FAILURE state: {}", record.id, e);
    }
}

async fn store_with_retry(backend: &dyn ResultBackend, record: &SubmissionRecord) -> Result<(), Error> {
    let mut attempt = 1;
    loop {
        match backend.store(record).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < FINAL_STORE_ATTEMPTS => {
                warn!(
                    "[{}] Store attempt {}/{} failed: {}",
                    record.id, attempt, FINAL_STORE_ATTEMPTS, e
                );
                attempt += 1;
                tokio::time::sleep(FINAL_STORE_RETRY_DELAY).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Periodically drops finished records older than `expires`
pub(super) async fn run_janitor(backend: Arc<dyn ResultBackend>, expires: Duration, every: Duration) {
    let expires = match chrono::Duration::from_std(expires) {
        Ok(d) => d,
        Err(e) => {
            warn!("Result expiry {:?} out of range, results are kept: {}", expires, e);
            return;
        }
    };

    let mut ticker = tokio::time::interval(every.max(Duration::from_millis(1)));
    loop {
        ticker.tick().await;
        let cutoff = Utc::now() - expires;
        match backend.purge_finished_before(cutoff).await {
            Ok(0) => {}
            Ok(n) => debug!("Purged {} expired results", n),
            Err(e) => error!("Failed to purge expired results: {}", e),
        }
    }
}
