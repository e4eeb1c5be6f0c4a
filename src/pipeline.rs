//! End-to-end run: load the three tables, merge them and write the outputs.

use std::path::PathBuf;
use std::time::Instant;

use arrow::record_batch::RecordBatch;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::loaders::{load_cognitive, load_pupil, load_task};
use crate::merge::{JoinStats, merge_datasets};
use crate::utils::logging::StageProgress;

/// Row counts, join statistics and written files of one run
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub cognitive_rows: usize,
    pub pupil_rows: usize,
    pub task_rows: usize,
    pub merged_rows: usize,
    pub merged_columns: usize,
    pub task_join: JoinStats,
    pub cognitive_join: JoinStats,
    pub outputs: Vec<PathBuf>,
}

impl PipelineSummary {
    /// Log the summary at info level
    pub fn log(&self) {
        log::info!(
            "Inputs: {} cognitive, {} pupil, {} task rows",
            self.cognitive_rows,
            self.pupil_rows,
            self.task_rows
        );
        log::info!(
            "Merged table: {} rows x {} columns",
            self.merged_rows,
            self.merged_columns
        );
        for (table, stats) in [("task", &self.task_join), ("cognitive", &self.cognitive_join)] {
            log::info!(
                "Joined {} {table} rows onto {} rows: {} unmatched, {} repeated keys",
                stats.right_rows,
                stats.left_rows,
                stats.unmatched_left_rows,
                stats.duplicate_right_keys
            );
        }
        for path in &self.outputs {
            log::info!("Wrote {}", path.display());
        }
    }
}

/// Run one pipeline stage behind a spinner
fn stage<F>(config: &PipelineConfig, message: &str, load: F) -> Result<RecordBatch>
where
    F: FnOnce(&PipelineConfig) -> Result<RecordBatch>,
{
    let progress = StageProgress::start(config.show_progress, message);
    let batch = load(config)?;
    progress.finish(&format!("{message}: {} rows", batch.num_rows()));
    Ok(batch)
}

/// Execute the whole merge; the first failure aborts the run
pub fn run(config: &PipelineConfig) -> Result<PipelineSummary> {
    let start = Instant::now();
    config.validate()?;

    let cognitive = stage(config, "Loading cognitive data", load_cognitive)?;
    let pupil = stage(config, "Loading pupil data", load_pupil)?;
    let task = stage(config, "Loading task data", load_task)?;

    let progress = StageProgress::start(config.show_progress, "Merging tables");
    let merged = merge_datasets(&pupil, &task, &cognitive, config)?;
    progress.finish(&format!("Merged {} rows", merged.batch.num_rows()));

    let paths = &config.paths;
    let outputs = [Some(&paths.cognitive_out), Some(&paths.merged_out), paths.merged_parquet.as_ref()]
        .into_iter()
        .flatten()
        .cloned()
        .collect();

    let summary = PipelineSummary {
        cognitive_rows: cognitive.num_rows(),
        pupil_rows: pupil.num_rows(),
        task_rows: task.num_rows(),
        merged_rows: merged.batch.num_rows(),
        merged_columns: merged.batch.num_columns(),
        task_join: merged.task_join,
        cognitive_join: merged.cognitive_join,
        outputs,
    };
    log::info!("Pipeline finished in {:?}", start.elapsed());
    Ok(summary)
}
