//! Building Tabix indices for bgzipped VCF files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use crate::tabix::{IndexBuilder, TabixIndex};

/// Command line arguments for `index` sub command.
#[derive(Parser, Debug)]
#[command(about = "Build the Tabix index of a bgzipped VCF file", long_about = None)]
pub struct Args {
    /// Path to the bgzipped VCF file.
    #[arg(long)]
    pub path_input: String,
    /// Path to the index to write, defaults to the input path with `.tbi` appended.
    #[arg(long)]
    pub path_output: Option<String>,
}

/// Main entry point for `index` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args = {:#?}", &args);

    let index = IndexBuilder::build_from_path(&args.path_input)
        .with_context(|| format!("could not index {:?}", &args.path_input))?;
    let path_output = args
        .path_output
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| TabixIndex::path_for(Path::new(&args.path_input)));
    index
        .write(&path_output)
        .with_context(|| format!("could not write index {:?}", &path_output))?;
    tracing::info!(
        "Wrote index of {} sequence(s) to {:?}",
        index.names().len(),
        &path_output
    );

    Ok(())
}
