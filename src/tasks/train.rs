use super::parse_args;
use crate::config::TrainerEntry;
use crate::constants::{OUTPUT_TAIL_LINES, TRAIN_TASK};
use crate::core::{Arguments, Task};
use crate::models::{ResolvedDataset, Trainer};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::process::Command;
use tracing::{debug, info};

/// Trains a forecaster by running the trainer's entry point.
///
/// The model code lives outside this service; the task only turns the
/// trainer and dataset into command line options and reports the outcome.
#[derive(Debug)]
pub struct TrainTask {
    trainers: HashMap<String, TrainerEntry>,
}

#[derive(Debug, Deserialize)]
struct TrainArgs {
    trainer: Trainer,
    dataset: ResolvedDataset,
    #[serde(default)]
    partitions: Vec<Arguments>,
}

impl TrainTask {
    pub fn new(trainers: HashMap<String, TrainerEntry>) -> Self {
        Self { trainers }
    }
}

/// Command line options understood by the training entry points
pub fn training_options(
    trainer: &Trainer,
    dataset: &ResolvedDataset,
    partitions: &[Arguments],
) -> Vec<String> {
    let spec = &dataset.spec;
    let mut options = vec![
        "--train".to_string(),
        dataset.path.display().to_string(),
    ];

    let mut push_many = |flag: &str, values: &[String]| {
        for value in values {
            options.push(flag.to_string());
            options.push(value.clone());
        }
    };
    push_many("--group-ids", &spec.group_ids);
    push_many("--time-varying-known", &spec.time_varying_known);
    push_many("--time-varying-unknown", &spec.time_varying_unknown);
    push_many("--static-categoricals", &spec.static_categoricals);
    push_many("--static-reals", &spec.static_reals);

    options.extend([
        "--timestamp".to_string(),
        spec.timestamp.clone(),
        "--target".to_string(),
        spec.target.clone(),
        "--max-prediction-length".to_string(),
        trainer.max_prediction_length.to_string(),
        "--max-encoder-length".to_string(),
        trainer.max_encoder_length.to_string(),
        "--max-epochs".to_string(),
        trainer.max_epochs.to_string(),
        "--verbose".to_string(),
        trainer.verbose.to_string(),
    ]);
    if let Some(freq) = &spec.freq {
        options.extend(["--freq".to_string(), freq.clone()]);
    }
    if let Some(device) = &trainer.device {
        options.extend(["--device".to_string(), device.clone()]);
    }
    if !partitions.is_empty() {
        options.extend([
            "--partitions".to_string(),
            Value::from(partitions.to_vec()).to_string(),
        ]);
    }
    options
}

/// Last lines of a process stream
fn tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(OUTPUT_TAIL_LINES);
    lines[start..].join("\n")
}

#[async_trait::async_trait]
impl Task for TrainTask {
    fn name(&self) -> &str {
        TRAIN_TASK
    }

    fn required_args(&self) -> &[&str] {
        &["trainer", "dataset"]
    }

    fn argument_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "trainer": { "type": "object" },
                "dataset": { "type": "object" },
                "partitions": { "type": "array", "items": { "type": "object" } }
            }
        }))
    }

    async fn run(&self, args: Arguments) -> Result<Value, String> {
        let args: TrainArgs = parse_args(args)?;
        let entry = self
            .trainers
            .get(&args.trainer.name)
            .ok_or_else(|| format!("no entry point for trainer '{}'", args.trainer.name))?;
        let (program, leading) = entry
            .command
            .split_first()
            .ok_or_else(|| format!("empty command for trainer '{}'", args.trainer.name))?;

        let options = training_options(&args.trainer, &args.dataset, &args.partitions);
        debug!("Running {} {:?} {:?}", program, leading, options);

        let mut command = Command::new(program);
        command.args(leading).args(&options).kill_on_drop(true);
        if let Some(dir) = &entry.working_dir {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .await
            .map_err(|e| format!("failed to start '{}': {}", program, e))?;

        if !output.status.success() {
            return Err(format!(
                "training exited with {}: {}",
                output.status,
                tail(&output.stderr)
            ));
        }

        info!(
            "Trainer {} finished on dataset {}",
            args.trainer.name, args.dataset.spec.name
        );
        Ok(json!({
            "trainer": args.trainer.name,
            "exit_code": output.status.code(),
            "stdout": tail(&output.stdout),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dataset;
    use std::path::PathBuf;

    fn trainer() -> Trainer {
        Trainer {
            name: "seq2seq".into(),
            max_prediction_length: 6,
            max_encoder_length: 24,
            max_epochs: 3,
            device: Some("cpu".into()),
            verbose: 1,
        }
    }

    fn dataset() -> ResolvedDataset {
        ResolvedDataset {
            spec: Dataset {
                name: "sales".into(),
                group_ids: vec!["store".into(), "item".into()],
                timestamp: "date".into(),
                target: "units".into(),
                freq: Some("D".into()),
                time_varying_known: vec!["price".into()],
                time_varying_unknown: vec![],
                static_categoricals: vec![],
                static_reals: vec![],
            },
            path: PathBuf::from("/data/alice/sales.csv"),
        }
    }

    fn task(script: &str) -> TrainTask {
        let mut trainers = HashMap::new();
        trainers.insert(
            "seq2seq".to_string(),
            TrainerEntry {
                command: vec!["sh".into(), "-c".into(), script.into(), "sh".into()],
                working_dir: None,
            },
        );
        TrainTask::new(trainers)
    }

    fn args() -> Arguments {
        json!({ "trainer": trainer(), "dataset": dataset() })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn options_repeat_multi_valued_flags() {
        let partition = json!({ "store": 1 }).as_object().cloned().unwrap();
        let options = training_options(&trainer(), &dataset(), &[partition]);
        let joined = options.join(" ");

        assert!(joined.starts_with("--train /data/alice/sales.csv"));
        assert!(joined.contains("--group-ids store --group-ids item"));
        assert!(joined.contains("--time-varying-known price"));
        assert!(!joined.contains("--static-reals"));
        assert!(joined.contains("--freq D"));
        assert!(joined.contains("--device cpu"));
        assert!(joined.ends_with(r#"--partitions [{"store":1}]"#));
    }

    #[tokio::test]
    async fn successful_run_reports_stdout() {
        let out = task("echo fitted; exit 0").run(args()).await.unwrap();
        assert_eq!(out["trainer"], "seq2seq");
        assert_eq!(out["exit_code"], 0);
        assert_eq!(out["stdout"], "fitted");
    }

    #[tokio::test]
    async fn non_zero_exit_fails_with_stderr() {
        let err = task("echo 'CUDA unavailable' >&2; exit 3")
            .run(args())
            .await
            .unwrap_err();
        assert!(err.starts_with("training exited with"), "{}", err);
        assert!(err.ends_with("CUDA unavailable"), "{}", err);
    }

    #[tokio::test]
    async fn unknown_trainer_fails() {
        let err = TrainTask::new(HashMap::new()).run(args()).await.unwrap_err();
        assert_eq!(err, "no entry point for trainer 'seq2seq'");
    }

    #[test]
    fn tail_keeps_last_lines() {
        let text: String = (0..30).map(|i| format!("line {}\n", i)).collect();
        let kept = tail(text.as_bytes());
        assert!(kept.starts_with("line 10"));
        assert!(kept.ends_with("line 29"));
    }
}
