//! Run configuration for the command-line driver.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::EvolutionConfig;

/// Input and output locations plus the search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Power curve CSV (speed, thrust coefficient, power in MW).
    pub power_curve: PathBuf,
    /// Wind record CSVs; all files are binned together.
    pub wind_data: Vec<PathBuf>,
    /// Directory of saved layouts used to seed the initial population.
    #[serde(default)]
    pub seed_layouts: Option<PathBuf>,
    /// Where the best layout is written.
    #[serde(default = "default_output_layout")]
    pub output_layout: PathBuf,
    /// Where the per-generation history is written (JSON).
    #[serde(default)]
    pub output_history: Option<PathBuf>,
    /// Directory receiving the best layout of every generation.
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,
    /// Search parameters.
    #[serde(default)]
    pub evolution: EvolutionConfig,
}

fn default_output_layout() -> PathBuf {
    PathBuf::from("sol.csv")
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            power_curve: PathBuf::from("power_curve.csv"),
            wind_data: vec![PathBuf::from("wind_data_combined.csv")],
            seed_layouts: None,
            output_layout: default_output_layout(),
            output_history: Some(PathBuf::from("history.json")),
            archive_dir: None,
            evolution: EvolutionConfig::default(),
        }
    }
}
