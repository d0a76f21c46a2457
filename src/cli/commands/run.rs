use crate::cli::commands::open_store;
use crate::cli::output::{format_number, success, tree_section};
use crate::core::{Config, Pipeline};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct RunArgs {
    /// SQLite read store
    #[arg(value_name = "DB")]
    pub database: PathBuf,

    /// Restrict the run to one sample
    #[arg(short, long)]
    pub sample: Option<String>,

    /// Marker pattern (concrete nucleotides)
    #[arg(short, long, value_name = "PATTERN")]
    pub marker: Option<String>,

    /// Reads fetched and written per batch
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Hide the progress bar
    #[arg(long)]
    pub silent: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: RunArgs, mut config: Config) -> anyhow::Result<()> {
    let _span = tracing::info_span!("run").entered();

    if let Some(marker) = &args.marker {
        config.marker.pattern = Some(marker.clone());
    }
    if let Some(size) = args.batch_size {
        config.batch.batch_size = size;
    }
    if args.silent {
        config.batch.silent = true;
    }

    let mut store = open_store(&args.database)?;
    let pipeline = Pipeline::from_config(&config)?;
    let report = pipeline.run(&mut store, args.sample.as_deref())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    success(&format!(
        "Annotated {} reads, {} clusters in {} samples",
        format_number(report.annotation.processed),
        format_number(report.total_clusters()),
        report.clusters.len()
    ));
    let count = report.clusters.len();
    for (i, summary) in report.clusters.iter().enumerate() {
        tree_section(
            &summary.sample,
            &[
                ("Qualifying reads", format_number(summary.qualifying)),
                ("Clusters", format_number(summary.clusters)),
            ],
            i + 1 == count,
        );
    }
    Ok(())
}
