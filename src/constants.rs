use std::time::Duration;

/// Key under which a non-mapping result of the previous step is bound
pub const PREVIOUS_RESULT_KEY: &str = "result";

/// Registry name of the dataset resolution task
pub const LOAD_DATASET_TASK: &str = "LoadDatasetTask";

/// Registry name of the training task
pub const TRAIN_TASK: &str = "TrainTask";

/// Only tabular format understood by the training entry points
pub const DATASET_FORMAT: &str = "pandas";

/// File extension of stored datasets
pub const DATASET_EXTENSION: &str = "csv";

/// Default number of broker workers
pub const DEFAULT_WORKERS: usize = 4;

/// Default lifetime of finished results
pub const DEFAULT_RESULT_EXPIRES: Duration = Duration::from_secs(24 * 60 * 60);

/// Default period of the expired results sweep
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default lifetime of access tokens
pub const DEFAULT_ACCESS_TOKEN_EXPIRES: Duration = Duration::from_secs(30 * 60);

/// Default listening port of the HTTP API
pub const DEFAULT_PORT: u16 = 8000;

/// Default directory holding per-user datasets
pub const DEFAULT_DATASETS_DIR: &str = "datasets";

/// Default SQLite file of the result backend
pub const DEFAULT_DATABASE_PATH: &str = "anyforecast.db";

/// Lines of training process output kept in results and failures
pub const OUTPUT_TAIL_LINES: usize = 20;

/// Attempts made to store the final state of a submission
pub const FINAL_STORE_ATTEMPTS: u32 = 3;

/// Pause between two attempts to store a final state
pub const FINAL_STORE_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Task name reported when a submission fails outside of its steps
pub const BROKER_TASK_NAME: &str = "broker";
