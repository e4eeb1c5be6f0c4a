use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use pupil_axcpt::config::{PathConfig, PipelineConfig};
use pupil_axcpt::io::{CsvReadOptions, read_csv};
use pupil_axcpt::sas::{SasReadOptions, SasReader};
use pupil_axcpt::utils::logging::{print_sas_metadata, print_schema, print_table_summary};

#[derive(Parser)]
#[command(name = "pupil-axcpt")]
#[command(about = "Merge cognitive, pupillometry and AX-CPT task data into one CSV")]
struct Args {
    /// JSON configuration file; defaults are used for anything it omits
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the input files under their standard names
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Directory for the cognitive and merged CSV outputs
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also write the merged table as Parquet
    #[arg(long)]
    parquet: Option<PathBuf>,

    /// Fail when the task or cognitive table repeats a subject id
    #[arg(long)]
    strict_keys: bool,

    /// Disable stage spinners
    #[arg(long)]
    no_progress: bool,

    /// Print the SAS dataset metadata and input table schemas, then exit
    #[arg(long)]
    describe: bool,
}

fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(dir) = &args.data_dir {
        let parquet = config.paths.merged_parquet.take();
        config.paths = PathConfig {
            merged_parquet: parquet,
            ..PathConfig::in_dir(dir)
        };
    }
    if let Some(path) = &args.parquet {
        config.paths.merged_parquet = Some(path.clone());
    }
    if let Some(dir) = &args.output_dir {
        config.set_output_dir(dir);
    }
    config.strict_keys |= args.strict_keys;
    config.show_progress = !args.no_progress;
    Ok(config)
}

fn describe(config: &PipelineConfig) -> Result<()> {
    let paths = &config.paths;
    let reader = SasReader::open(
        &paths.cognitive_sas,
        SasReadOptions {
            convert_dates: config.sas.convert_dates,
        },
    )
    .with_context(|| format!("Failed to read {}", paths.cognitive_sas.display()))?;
    print_sas_metadata(reader.metadata());
    println!();
    print_schema("cognitive (decoded)", reader.metadata().row_count, &reader.schema());

    let options = CsvReadOptions::from(&config.csv);
    for (name, path) in [("pupil", &paths.pupil_csv), ("task", &paths.task_csv)] {
        let batch = read_csv(path, &options)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        println!();
        print_table_summary(name, &batch);
    }
    Ok(())
}

fn main() -> Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = build_config(&args)?;

    if args.describe {
        return describe(&config);
    }

    let start = Instant::now();
    info!(
        "Merging {} and {} onto {}",
        config.paths.task_csv.display(),
        config.paths.cognitive_sas.display(),
        config.paths.pupil_csv.display()
    );
    let summary = pupil_axcpt::run(&config).context("Merge failed")?;
    summary.log();
    info!("Done in {:?}", start.elapsed());
    Ok(())
}
