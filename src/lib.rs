//! Merge cognitive assessment data (SAS7BDAT), long-format pupillometry and
//! AX-CPT task results into one analysis table.
//!
//! The pipeline is linear: the cognitive table is loaded, restricted to the
//! listed variables, given an APOE-e4 carrier flag and cleaned of missing
//! codes; the pupil and task CSVs are loaded; task and cognitive data are
//! left-joined onto the pupil trials and the result is written as CSV.

pub mod config;
pub mod error;
pub mod io;
pub mod loaders;
pub mod merge;
pub mod pipeline;
pub mod sas;
pub mod utils;

// Re-export the most common types for easier use
pub use config::{PipelineConfig, SentinelRule};
pub use error::{MergeError, Result};
pub use merge::{JoinOptions, JoinStats, MergeOutput, left_join, merge_datasets};
pub use pipeline::{PipelineSummary, run};
pub use sas::{SasReadOptions, SasReader, read_sas};

// Arrow types
pub use arrow::record_batch::RecordBatch;
