use crate::cli::commands::open_store;
use crate::cli::output::{format_number, info, success, tree_section};
use crate::core::{ClusterAssignments, ClusterSummary, Config, IdentityClusterer};
use crate::storage::ReadStore;
use crate::AmpliclusterError;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args)]
pub struct ClusterArgs {
    /// SQLite read store
    #[arg(value_name = "DB")]
    pub database: PathBuf,

    /// Sample to cluster
    #[arg(short, long)]
    pub sample: String,

    /// Minimum trimmed length of a qualifying read
    #[arg(short = 'l', long)]
    pub min_length: Option<usize>,

    /// Largest distance to a cluster representative (0.03 = 97% identity)
    #[arg(short, long)]
    pub cutoff: Option<f64>,

    /// Print the assignments as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ClusterOutput<'a> {
    summary: &'a ClusterSummary,
    assignments: &'a ClusterAssignments,
}

pub fn run(args: ClusterArgs, mut config: Config) -> anyhow::Result<()> {
    let _span = tracing::info_span!("cluster_command").entered();

    if let Some(min_length) = args.min_length {
        config.clustering.min_length = min_length;
    }
    if let Some(cutoff) = args.cutoff {
        config.clustering.identity_cutoff = cutoff;
    }
    config.validate()?;

    let mut store = open_store(&args.database)?;
    if !store.samples()?.contains(&args.sample) {
        return Err(AmpliclusterError::NotFound(format!("sample {}", args.sample)).into());
    }
    let clusterer = IdentityClusterer::from_config(&config)?;
    let (assignments, summary) = clusterer.cluster_with_summary(&mut store, &args.sample)?;

    if args.json {
        let output = ClusterOutput {
            summary: &summary,
            assignments: &assignments,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if assignments.is_empty() {
        info(&format!("No qualifying reads in sample {}", args.sample));
        return Ok(());
    }

    success(&format!(
        "Clustered {} reads of {} into {} clusters",
        format_number(summary.qualifying),
        summary.sample,
        format_number(summary.clusters)
    ));
    tree_section(
        "Clustering",
        &[
            ("Minimum length", config.clustering.min_length.to_string()),
            ("Identity cutoff", format!("{}", config.clustering.identity_cutoff)),
            ("Comparisons", format_number(summary.comparisons)),
        ],
        true,
    );
    Ok(())
}
