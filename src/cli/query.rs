//! Printing the lines of a region.

use std::io::{BufWriter, Write};

use anyhow::Context;
use clap::Parser;
use noodles::core::Region;

use crate::tabix::TabixReader;

/// Command line arguments for `query` sub command.
#[derive(Parser, Debug)]
#[command(
    about = "Print the lines of a bgzipped and indexed VCF file overlapping a region",
    long_about = None
)]
pub struct Args {
    /// Path to the bgzipped VCF file with its Tabix index.
    #[arg(long)]
    pub path_input: String,
    /// The region as `chrom`, `chrom:start` or `chrom:start-end` (1-based, inclusive).
    #[arg(long)]
    pub region: String,
    /// Also print the header.
    #[arg(long, default_value_t = false)]
    pub print_header: bool,
}

/// Convert a region string into a chromosome and 1-based half-open interval.
fn parse_region(text: &str) -> Result<(String, i32, i32), anyhow::Error> {
    let region: Region = text
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid region {:?}: {}", text, e))?;
    let interval = region.interval();
    let start = interval.start().map(usize::from).unwrap_or(1);
    let end = match interval.end() {
        Some(end) => usize::from(end) + 1,
        None => i32::MAX as usize,
    };
    Ok((
        String::from_utf8_lossy(region.name()).to_string(),
        i32::try_from(start).unwrap_or(i32::MAX),
        i32::try_from(end).unwrap_or(i32::MAX),
    ))
}

/// Run the query, writing to `writer`; returns the number of lines written.
pub fn run_with_writer(writer: &mut dyn Write, args: &Args) -> Result<usize, anyhow::Error> {
    let (chrom, start, end) = parse_region(&args.region)?;
    let mut reader = TabixReader::open(&args.path_input)
        .with_context(|| format!("could not open {:?}", &args.path_input))?;
    if args.print_header {
        writer.write_all(reader.header().text().as_bytes())?;
    }

    let mut count = 0;
    for line in reader
        .query(&chrom, start, end)
        .with_context(|| format!("could not query {}", &args.region))?
    {
        match line {
            Ok(line) => {
                writeln!(writer, "{}", line.raw())?;
                count += 1;
            }
            Err(e) if e.is_recoverable() => tracing::warn!("skipping line: {}", e),
            Err(e) => return Err(e.into()),
        }
    }
    reader.close();

    tracing::info!("{} line(s) overlap {}", count, &args.region);
    Ok(count)
}

/// Main entry point for `query` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args = {:#?}", &args);

    let stdout = std::io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    run_with_writer(&mut writer, args)?;
    writer.flush()?;

    Ok(())
}
