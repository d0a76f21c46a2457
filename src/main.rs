use amplicluster::cli::{Cli, Commands};
use amplicluster::AmpliclusterError;
use clap::Parser;
use colored::*;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // Log level from AMPLICLUSTER_LOG, RUST_LOG takes precedence
    let log_level = std::env::var("AMPLICLUSTER_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        let exit_code = match e.downcast_ref::<AmpliclusterError>() {
            Some(AmpliclusterError::Config(_)) => 2,
            Some(AmpliclusterError::Io(_)) => 3,
            Some(AmpliclusterError::Matcher(_)) | Some(AmpliclusterError::Distance(_)) => 4,
            Some(AmpliclusterError::Storage(_)) => 5,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = amplicluster::cli::load_config(cli.config.as_deref())?;

    let num_threads = amplicluster::utils::parallel::effective_threads(cli.thread_count(&config));
    amplicluster::utils::parallel::configure_thread_pool(num_threads)?;

    if cli.verbose > 0 {
        eprintln!("Using {} threads", num_threads);
    }

    match cli.command {
        Commands::Annotate(args) => amplicluster::cli::commands::annotate::run(args, config),
        Commands::Cluster(args) => amplicluster::cli::commands::cluster::run(args, config),
        Commands::Run(args) => amplicluster::cli::commands::run::run(args, config),
        Commands::Samples(args) => amplicluster::cli::commands::samples::run(args),
        Commands::Config(args) => amplicluster::cli::commands::config::run(args, config),
    }
}
