use super::parse_args;
use crate::constants::{DATASET_EXTENSION, DATASET_FORMAT, LOAD_DATASET_TASK};
use crate::core::{Arguments, Task};
use crate::models::{Dataset, ResolvedDataset, User};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Locates a user's dataset and checks it against its declared schema.
///
/// The data itself is read by the training entry point; this task hands it
/// the resolved file, the partitions to train on and optionally the column
/// dtypes.
#[derive(Debug)]
pub struct LoadDatasetTask {
    datasets_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct LoadDatasetArgs {
    dataset: Dataset,
    user: User,
    #[serde(default)]
    partitions: Option<Vec<Arguments>>,
    #[serde(default = "default_format")]
    format: String,
    #[serde(default)]
    return_schema: bool,
    #[serde(default)]
    enforce_schema_dtypes: bool,
}

fn default_format() -> String {
    DATASET_FORMAT.to_string()
}

impl LoadDatasetTask {
    pub fn new(datasets_dir: PathBuf) -> Self {
        Self { datasets_dir }
    }

    fn dataset_path(&self, user: &User, dataset: &Dataset) -> Result<PathBuf, String> {
        for component in [&user.username, &dataset.name] {
            if !is_plain_name(component) {
                return Err(format!("invalid path component '{}'", component));
            }
        }
        Ok(self
            .datasets_dir
            .join(&user.username)
            .join(format!("{}.{}", dataset.name, DATASET_EXTENSION)))
    }
}

/// Rejects names that would escape the user's directory
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

async fn read_header(path: &Path) -> Result<BTreeSet<String>, String> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    let header = BufReader::new(file)
        .lines()
        .next_line()
        .await
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?
        .ok_or_else(|| format!("{} is empty", path.display()))?;

    Ok(header
        .split(',')
        .map(|c| c.trim().trim_matches('"').to_string())
        .collect())
}

fn check_partitions(dataset: &Dataset, partitions: &[Arguments]) -> Result<(), String> {
    for partition in partitions {
        if let Some(key) = partition.keys().find(|k| !dataset.group_ids.contains(k)) {
            return Err(format!(
                "partition key '{}' is not a group id of dataset '{}'",
                key, dataset.name
            ));
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl Task for LoadDatasetTask {
    fn name(&self) -> &str {
        LOAD_DATASET_TASK
    }

    fn required_args(&self) -> &[&str] {
        &["dataset", "user"]
    }

    fn argument_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "dataset": { "type": "object" },
                "user": { "type": "object" },
                "partitions": { "type": ["array", "null"], "items": { "type": "object" } },
                "format": { "type": "string" },
                "return_schema": { "type": "boolean" },
                "enforce_schema_dtypes": { "type": "boolean" }
            }
        }))
    }

    async fn run(&self, args: Arguments) -> Result<Value, String> {
        let args: LoadDatasetArgs = parse_args(args)?;

        if args.format != DATASET_FORMAT {
            return Err(format!("unsupported dataset format '{}'", args.format));
        }

        let path = self.dataset_path(&args.user, &args.dataset)?;
        match tokio::fs::try_exists(&path).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(format!(
                    "dataset '{}' not found for user '{}'",
                    args.dataset.name, args.user.username
                ))
            }
            Err(e) => {
                return Err(format!(
                    "cannot access dataset '{}': {}",
                    args.dataset.name, e
                ))
            }
        }

        let partitions = args.partitions.unwrap_or_default();
        check_partitions(&args.dataset, &partitions)?;

        if args.enforce_schema_dtypes {
            let header = read_header(&path).await?;
            let missing: Vec<&str> = args
                .dataset
                .columns()
                .into_iter()
                .filter(|c| !header.contains(*c))
                .collect();
            if !missing.is_empty() {
                return Err(format!(
                    "dataset '{}' is missing column(s): {}",
                    args.dataset.name,
                    missing.join(", ")
                ));
            }
        }

        debug!("Resolved dataset {} at {}", args.dataset.name, path.display());

        let resolved = ResolvedDataset {
            spec: args.dataset.clone(),
            path,
        };
        let mut output = json!({
            "dataset": resolved,
            "partitions": partitions,
            "format": args.format,
        });
        if args.return_schema {
            output["schema"] = json!(args.dataset.dtypes());
        }
        Ok(output)
    }
}
