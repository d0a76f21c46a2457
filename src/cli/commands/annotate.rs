use crate::cli::commands::open_store;
use crate::cli::output::{format_number, success, tree_section};
use crate::core::{BatchOrchestrator, Config};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct AnnotateArgs {
    /// SQLite read store
    #[arg(value_name = "DB")]
    pub database: PathBuf,

    /// Only annotate reads of this sample
    #[arg(short, long)]
    pub sample: Option<String>,

    /// Reads fetched and written per batch
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Marker pattern (concrete nucleotides)
    #[arg(short, long, value_name = "PATTERN")]
    pub marker: Option<String>,

    /// Edits tolerated per marker occurrence
    #[arg(short = 'k', long)]
    pub max_mismatches: Option<usize>,

    /// Count substitutions only
    #[arg(long)]
    pub no_indels: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub silent: bool,
}

impl AnnotateArgs {
    /// Command line values take precedence over the configuration file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(size) = self.batch_size {
            config.batch.batch_size = size;
        }
        if let Some(marker) = &self.marker {
            config.marker.pattern = Some(marker.clone());
        }
        if let Some(k) = self.max_mismatches {
            config.marker.max_mismatches = k;
        }
        if self.no_indels {
            config.marker.allow_indels = false;
        }
        if self.silent {
            config.batch.silent = true;
        }
    }
}

pub fn run(args: AnnotateArgs, mut config: Config) -> anyhow::Result<()> {
    let _span = tracing::info_span!("annotate").entered();

    args.apply(&mut config);
    config.validate()?;

    let mut store = open_store(&args.database)?;
    let orchestrator = BatchOrchestrator::from_config(&config)?;
    let summary = orchestrator.run(&mut store, args.sample.as_deref(), config.batch.batch_size)?;

    success(&format!(
        "Annotated {} reads in {} batches",
        format_number(summary.processed),
        summary.batches
    ));
    tree_section(
        "Annotation",
        &[
            ("Read store", args.database.display().to_string()),
            ("Marker positive", format_number(summary.marker_positive)),
            ("Malformed", format_number(summary.malformed)),
        ],
        true,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = AnnotateArgs {
            database: PathBuf::from("reads.db"),
            sample: None,
            batch_size: Some(64),
            marker: Some("ACGTACGT".to_string()),
            max_mismatches: Some(1),
            no_indels: true,
            silent: false,
        };
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.batch.batch_size, 64);
        assert_eq!(config.marker.pattern.as_deref(), Some("ACGTACGT"));
        assert_eq!(config.marker.max_mismatches, 1);
        assert!(!config.marker.allow_indels);
        assert!(!config.batch.silent);
    }
}
