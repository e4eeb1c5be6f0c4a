//! Merging the pupil, task and cognitive tables into one analysis table.

pub mod join;

pub use join::{JoinOptions, JoinStats, left_join, normalize_keys};

use std::time::Instant;

use arrow::record_batch::RecordBatch;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::io::{write_csv, write_parquet};
use crate::utils::logging::log_table_written;

/// The merged table and the statistics of both joins
#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub batch: RecordBatch,
    pub task_join: JoinStats,
    pub cognitive_join: JoinStats,
}

/// Join task results and cognitive data onto the pupil trials, then write
/// the merged CSV (and Parquet, when configured)
///
/// Pupil rows drive the output: with unique subject keys on the right the
/// result has exactly one row per pupil row.
pub fn merge_datasets(
    pupil: &RecordBatch,
    task: &RecordBatch,
    cognitive: &RecordBatch,
    config: &PipelineConfig,
) -> Result<MergeOutput> {
    let start = Instant::now();
    let keys = &config.keys;

    let (with_task, task_join) = left_join(
        pupil,
        task,
        &keys.pupil_key,
        &keys.task_key,
        &JoinOptions {
            left_table: "pupil".to_string(),
            right_table: "task".to_string(),
            strict_keys: config.strict_keys,
        },
    )?;

    let (batch, cognitive_join) = left_join(
        &with_task,
        cognitive,
        &keys.pupil_key,
        &keys.cognitive_key,
        &JoinOptions {
            left_table: "pupil+task".to_string(),
            right_table: "cognitive".to_string(),
            strict_keys: config.strict_keys,
        },
    )?;

    for (table, stats) in [("task", &task_join), ("cognitive", &cognitive_join)] {
        if stats.unmatched_left_rows > 0 {
            log::info!(
                "{} of {} pupil rows have no {table} record",
                stats.unmatched_left_rows,
                stats.left_rows
            );
        }
    }

    let paths = &config.paths;
    write_csv(&batch, &paths.merged_out)?;
    log_table_written("merged", &paths.merged_out, batch.num_rows(), Some(start.elapsed()));
    if let Some(parquet) = &paths.merged_parquet {
        write_parquet(&batch, parquet)?;
        log_table_written("merged", parquet, batch.num_rows(), None);
    }

    Ok(MergeOutput {
        batch,
        task_join,
        cognitive_join,
    })
}
