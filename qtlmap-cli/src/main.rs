//! qtlmap: genotype ingestion and filtering for QTL analysis.
//!
//! CLI entry point using clap for argument parsing.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "qtlmap",
    version,
    about = "qtlmap-rs: region-bounded genotype ingestion for QTL analysis",
    long_about = "Reads genotype records for one genomic region from an indexed VCF,\n\
                  reconciles them against the analysis cohort, and filters variants by\n\
                  allele-frequency and sample-count thresholds."
)]
struct Cli {
    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest and filter genotypes for one region, writing a variant summary
    Ingest(commands::ingest::IngestArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    tracing::info!("qtlmap v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Ingest(args) => commands::ingest::run(args),
    }
}
