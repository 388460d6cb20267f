//! Main entry point for the mgsync CLI.

use clap::{command, Parser, Subcommand};

use mgsync::{cli, common};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Multi-genome VCF synchronization and variant filtering"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the Tabix index of a bgzipped VCF file.
    Index(cli::index::Args),
    /// Print the lines overlapping a region.
    Query(cli::query::Args),
    /// Translate positions between reference and genome alleles.
    Translate(cli::translate::Args),
    /// Write the lines passing a filter set.
    Filter(cli::filter::Args),
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    // Install collector and go into sub commands.
    tracing::subscriber::with_default(collector, || {
        tracing::info!(
            "mgsync {} ({})",
            common::version(),
            mgsync::built_info::RUSTC_VERSION
        );

        match &cli.command {
            Commands::Index(args) => cli::index::run(&cli.common, args)?,
            Commands::Query(args) => cli::query::run(&cli.common, args)?,
            Commands::Translate(args) => cli::translate::run(&cli.common, args)?,
            Commands::Filter(args) => cli::filter::run(&cli.common, args)?,
        }

        tracing::info!("All done. Have a nice day!");

        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}
