pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "amplicluster",
    version,
    about = "Quality trimming, marker screening and identity clustering of amplicon reads",
    long_about = "Amplicluster annotates every read of a read store with a quality trim region \
                  and an approximate marker count, then groups the qualifying reads of each \
                  sample into identity clusters with a greedy first-fit strategy."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of threads to use (0 = from the configuration, else all available)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE", global = true, env = "AMPLICLUSTER_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Requested worker threads: `-j` when given, otherwise `performance.threads`.
    pub fn thread_count(&self, config: &crate::core::Config) -> usize {
        if self.threads > 0 {
            self.threads
        } else {
            config.performance.threads
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write trim bounds and marker counts for every read
    Annotate(commands::annotate::AnnotateArgs),

    /// Cluster the annotated reads of one sample
    Cluster(commands::cluster::ClusterArgs),

    /// Annotate, then cluster every sample
    Run(commands::run::RunArgs),

    /// List the samples in a read store
    Samples(commands::samples::SamplesArgs),

    /// Print or write the default configuration
    Config(commands::config::ConfigArgs),
}

/// Loads the configuration file if one was given, defaults otherwise.
pub fn load_config(path: Option<&std::path::Path>) -> crate::Result<crate::core::Config> {
    match path {
        Some(path) => crate::core::config::load_config(path),
        None => Ok(crate::core::config::default_config()),
    }
}
