//! Tasks registered by the service at startup

mod load_dataset;
mod train;

use crate::config::TrainingConfig;
use crate::core::{Arguments, TaskDescriptor, TaskRegistry};
use crate::errors::RegistryError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

pub use load_dataset::LoadDatasetTask;
pub use train::TrainTask;

/// Builds the registry holding every task this service can run
pub fn default_registry(config: &TrainingConfig) -> Result<TaskRegistry, RegistryError> {
    let mut registry = TaskRegistry::new();
    registry.register(TaskDescriptor::new(LoadDatasetTask::new(
        config.datasets_dir.clone(),
    ))?)?;
    registry.register(TaskDescriptor::new(TrainTask::new(config.trainers.clone()))?)?;
    for name in registry.names() {
        let descriptor = registry.get_task(name)?;
        debug!(
            "Task {} requires {:?}",
            name,
            descriptor.input_schema().required()
        );
    }
    info!(
        "Registered {} tasks: {}",
        registry.len(),
        registry.names().join(", ")
    );
    Ok(registry)
}

/// Deserializes task arguments into a typed struct
fn parse_args<T: DeserializeOwned>(args: Arguments) -> Result<T, String> {
    serde_json::from_value(Value::Object(args)).map_err(|e| format!("bad arguments: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BrokerConfig, ResultBackendConfig, TrainerEntry};
    use crate::constants::{LOAD_DATASET_TASK, TRAIN_TASK};
    use crate::core::{Broker, InMemoryBackend, TaskChainer};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn registers_both_training_tasks() {
        let registry = default_registry(&TrainingConfig::default()).unwrap();
        assert_eq!(registry.names(), vec![LOAD_DATASET_TASK, TRAIN_TASK]);
    }

    #[tokio::test]
    async fn dataset_then_training_chain_runs_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("alice")).unwrap();
        std::fs::write(
            dir.path().join("alice").join("sales.csv"),
            "store,date,units\n1,2024-01-01,3\n",
        )
        .unwrap();

        let mut trainers = HashMap::new();
        trainers.insert(
            "seq2seq".to_string(),
            TrainerEntry {
                command: vec!["sh".into(), "-c".into(), "echo $@".into(), "sh".into()],
                working_dir: None,
            },
        );
        let registry = default_registry(&TrainingConfig {
            datasets_dir: dir.path().to_path_buf(),
            trainers,
        })
        .unwrap();

        let mut chainer = TaskChainer::new();
        chainer
            .add_task(
                registry.get_task(LOAD_DATASET_TASK).unwrap(),
                json!({
                    "dataset": {
                        "name": "sales",
                        "group_ids": ["store"],
                        "timestamp": "date",
                        "target": "units"
                    },
                    "user": { "username": "alice" },
                    "partitions": null,
                    "format": "pandas",
                    "return_schema": true,
                    "enforce_schema_dtypes": true
                })
                .as_object()
                .cloned()
                .unwrap(),
            )
            .unwrap();
        chainer
            .add_task(
                registry.get_task(TRAIN_TASK).unwrap(),
                json!({
                    "trainer": {
                        "name": "seq2seq",
                        "max_prediction_length": 6,
                        "max_encoder_length": 24
                    }
                })
                .as_object()
                .cloned()
                .unwrap(),
            )
            .unwrap();

        let broker = Broker::start(
            Arc::new(InMemoryBackend::new()),
            &BrokerConfig {
                workers: 1,
                result_expires: None,
                cleanup_interval: Duration::from_secs(60),
                result_backend: ResultBackendConfig::Memory,
            },
        );
        let handle = chainer.make_chain().unwrap().submit(&broker).await.unwrap();
        let result = handle
            .wait(Duration::from_millis(10), Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(result["trainer"], "seq2seq");
        assert_eq!(result["exit_code"], 0);
        let stdout = result["stdout"].as_str().unwrap();
        assert!(stdout.contains("--train"));
        assert!(stdout.contains("sales.csv"));
        assert!(stdout.contains("--max-encoder-length 24"));
    }
}
