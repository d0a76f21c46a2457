use crate::cli::commands::open_store;
use crate::cli::output::{format_number, warning};
use crate::storage::ReadStore;
use clap::Args;
use colored::*;
use std::path::PathBuf;

#[derive(Args)]
pub struct SamplesArgs {
    /// SQLite read store
    #[arg(value_name = "DB")]
    pub database: PathBuf,
}

pub fn run(args: SamplesArgs) -> anyhow::Result<()> {
    let store = open_store(&args.database)?;
    let samples = store.samples()?;
    if samples.is_empty() {
        warning(&format!("{} holds no reads", args.database.display()));
        return Ok(());
    }

    for sample in &samples {
        let count = store.count(Some(sample))?;
        println!("{:<30} {:>12}", sample.bold(), format_number(count));
    }
    Ok(())
}
