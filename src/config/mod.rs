//! Configuration for the merge pipeline.
//!
//! Every path, key name and recoding rule the pipeline uses lives here. The
//! defaults reproduce the study's file layout relative to a data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, Result};

/// Default number of rows per CSV read batch
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Helper function to get batch size from environment
#[must_use]
pub fn get_batch_size() -> Option<usize> {
    std::env::var("AXCPT_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
}

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// SAS7BDAT file with the cognitive scores
    pub cognitive_sas: PathBuf,
    /// CSV listing the cognitive variables to keep (column `NAME`)
    pub cognitive_variables: PathBuf,
    /// Long-format pupillometry CSV
    pub pupil_csv: PathBuf,
    /// Processed AX-CPT CSV
    pub task_csv: PathBuf,
    /// Intermediate cognitive CSV
    pub cognitive_out: PathBuf,
    /// Final merged CSV
    pub merged_out: PathBuf,
    /// Optional Parquet copy of the merged table
    pub merged_parquet: Option<PathBuf>,
}

impl PathConfig {
    /// Default file layout below `dir`
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            cognitive_sas: dir.join("vetsa2merged_23apr2015.sas7bdat"),
            cognitive_variables: dir.join("AX-CPT_CogVariables.csv"),
            pupil_csv: dir.join("pupilDS_long.csv"),
            task_csv: dir.join("AX-CPT_V2_processed.csv"),
            cognitive_out: dir.join("cogData.csv"),
            merged_out: dir.join("pupil_AX-CPT.csv"),
            merged_parquet: None,
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self::in_dir(Path::new("data"))
    }
}

/// Subject identifier columns of each table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Key in the pupillometry (base) table
    pub pupil_key: String,
    /// Key in the task table
    pub task_key: String,
    /// Key in the cognitive table
    pub cognitive_key: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            pupil_key: "vetsaid".to_string(),
            task_key: "SubjectID".to_string(),
            cognitive_key: "vetsaid".to_string(),
        }
    }
}

/// APOE carrier derivation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApoeRule {
    /// Genotype column, e.g. "3/4"
    pub genotype_column: String,
    /// Derived carrier flag column
    pub output_column: String,
    /// Allele marker searched for in the genotype
    pub allele: String,
}

impl Default for ApoeRule {
    fn default() -> Self {
        Self {
            genotype_column: "apoe2014".to_string(),
            output_column: "apoe4".to_string(),
            allele: "4".to_string(),
        }
    }
}

/// A code that stands for "missing" in one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelRule {
    /// Column the code applies to
    pub column: String,
    /// Value replaced with null
    pub value: f64,
}

impl SentinelRule {
    /// Create a new sentinel rule
    pub fn new(column: impl Into<String>, value: f64) -> Self {
        Self {
            column: column.into(),
            value,
        }
    }
}

/// Head-injury missing codes of the instrument
#[must_use]
pub fn default_sentinels() -> Vec<SentinelRule> {
    vec![
        SentinelRule::new("HADSHINJ_v2", 9.0),
        SentinelRule::new("NUMHINJ_v2", 99.0),
    ]
}

/// CSV reading options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    /// Rows per read batch
    pub batch_size: usize,
    /// Records scanned for schema inference; `None` scans the whole file
    pub infer_rows: Option<usize>,
    /// Field values read as null
    pub null_values: Vec<String>,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            batch_size: get_batch_size().unwrap_or(DEFAULT_BATCH_SIZE),
            infer_rows: None,
            null_values: ["", "NA", "NaN", "nan", "N/A", "NULL", "null"]
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// SAS7BDAT reading options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SasConfig {
    /// Convert numeric columns with SAS date/datetime formats to Arrow temporal types
    pub convert_dates: bool,
}

impl Default for SasConfig {
    fn default() -> Self {
        Self {
            convert_dates: true,
        }
    }
}

/// Configuration for the whole merge run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input and output locations
    pub paths: PathConfig,
    /// Join key names
    pub keys: KeyConfig,
    /// APOE carrier derivation
    pub apoe: ApoeRule,
    /// Missing-value codes to null out in the cognitive table
    pub sentinels: Vec<SentinelRule>,
    /// CSV reading options
    pub csv: CsvConfig,
    /// SAS reading options
    pub sas: SasConfig,
    /// Fail when a right-hand join table repeats a subject key
    pub strict_keys: bool,
    /// Show stage spinners on the terminal
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paths: PathConfig::default(),
            keys: KeyConfig::default(),
            apoe: ApoeRule::default(),
            sentinels: default_sentinels(),
            csv: CsvConfig::default(),
            sas: SasConfig::default(),
            strict_keys: false,
            show_progress: false,
        }
    }
}

impl PipelineConfig {
    /// Default configuration with every file below `dir`
    #[must_use]
    pub fn with_data_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            paths: PathConfig::in_dir(dir.as_ref()),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file; omitted fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| MergeError::io(path, e))?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Redirect both CSV outputs (and the Parquet export, if any) into `dir`
    pub fn set_output_dir(&mut self, dir: impl AsRef<Path>) {
        let dir = dir.as_ref();
        let relocate = |p: &Path| dir.join(p.file_name().unwrap_or(p.as_os_str()));
        self.paths.cognitive_out = relocate(&self.paths.cognitive_out);
        self.paths.merged_out = relocate(&self.paths.merged_out);
        if let Some(parquet) = self.paths.merged_parquet.take() {
            self.paths.merged_parquet = Some(relocate(&parquet));
        }
    }

    /// Check the configuration before any file is touched
    pub fn validate(&self) -> Result<()> {
        let inputs = [
            ("cognitive SAS file", &self.paths.cognitive_sas),
            ("cognitive variable list", &self.paths.cognitive_variables),
            ("pupil data", &self.paths.pupil_csv),
            ("task data", &self.paths.task_csv),
        ];
        for (purpose, path) in inputs {
            if !path.is_file() {
                return Err(MergeError::Config(format!(
                    "{purpose} not found: {}",
                    path.display()
                )));
            }
        }

        let keys = [
            &self.keys.pupil_key,
            &self.keys.task_key,
            &self.keys.cognitive_key,
        ];
        if keys.iter().any(|k| k.trim().is_empty()) {
            return Err(MergeError::Config("join key names must not be empty".into()));
        }
        if self.apoe.allele.is_empty() {
            return Err(MergeError::Config("APOE allele marker must not be empty".into()));
        }
        if self.csv.batch_size == 0 {
            return Err(MergeError::Config("CSV batch size must be positive".into()));
        }
        Ok(())
    }
}
