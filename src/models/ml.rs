use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Time series dataset description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// File stem of the dataset inside the user's directory
    pub name: String,
    /// Columns identifying a single time series
    pub group_ids: Vec<String>,
    /// Time column
    pub timestamp: String,
    /// Column to forecast
    pub target: String,
    /// Pandas frequency alias of the timestamp column
    #[serde(default)]
    pub freq: Option<String>,
    #[serde(default)]
    pub time_varying_known: Vec<String>,
    #[serde(default)]
    pub time_varying_unknown: Vec<String>,
    #[serde(default)]
    pub static_categoricals: Vec<String>,
    #[serde(default)]
    pub static_reals: Vec<String>,
}

impl Dataset {
    /// Every column the dataset declares, without duplicates
    pub fn columns(&self) -> Vec<&str> {
        self.dtypes().into_keys().collect()
    }

    /// Column dtypes the training entry points cast to
    pub fn dtypes(&self) -> BTreeMap<&str, &'static str> {
        let mut dtypes = BTreeMap::new();
        let reals: [&[String]; 4] = [
            std::slice::from_ref(&self.target),
            &self.time_varying_known,
            &self.time_varying_unknown,
            &self.static_reals,
        ];
        for column in reals.into_iter().flatten() {
            dtypes.insert(column.as_str(), "float64");
        }
        for column in self.group_ids.iter().chain(&self.static_categoricals) {
            dtypes.insert(column.as_str(), "category");
        }
        dtypes.insert(self.timestamp.as_str(), "datetime64[ns]");
        dtypes
    }
}

/// Dataset located on disk, produced by the dataset loading task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDataset {
    #[serde(flatten)]
    pub spec: Dataset,
    /// CSV file holding the data
    pub path: PathBuf,
}

/// Forecaster training parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trainer {
    /// Training entry point to run
    pub name: String,
    pub max_prediction_length: u32,
    pub max_encoder_length: u32,
    #[serde(default = "default_max_epochs")]
    pub max_epochs: u32,
    /// Torch device, the entry point's default when absent
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub verbose: u8,
}

fn default_max_epochs() -> u32 {
    10
}
