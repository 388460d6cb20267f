//! Translation of positions between reference, genome alleles and the meta genome.

use std::io::{BufWriter, Write};

use anyhow::Context;
use clap::Parser;

use crate::common::CancellationToken;
use crate::scan::{MultiFileScanner, ScanConfigBuilder, ScanOutcome, ScanScope, Scanner};
use crate::sync::{AlleleType, MultiGenome, OffsetCollector};

/// Command line arguments for `translate` sub command.
#[derive(Parser, Debug)]
#[command(about = "Translate reference positions onto genome alleles", long_about = None)]
pub struct Args {
    /// Paths to the bgzipped and indexed VCF files of the genomes.
    #[arg(long, required = true, num_args = 1..)]
    pub path_input: Vec<String>,
    /// The chromosome of the positions.
    #[arg(long)]
    pub chromosome: String,
    /// The genome to translate from the reference to, or from with `--to-genome`.
    #[arg(long)]
    pub genome: String,
    /// The allele of `--genome`.
    #[arg(long, value_enum, default_value_t = AlleleType::Paternal)]
    pub allele: AlleleType,
    /// The 1-based positions to translate.
    #[arg(long, required = true, num_args = 1.., allow_negative_numbers = true)]
    pub position: Vec<i32>,
    /// Translate from `--genome` to this genome instead of from the reference.
    #[arg(long, conflicts_with = "meta")]
    pub to_genome: Option<String>,
    /// The allele of `--to-genome`, defaults to `--allele`.
    #[arg(long, value_enum, requires = "to_genome")]
    pub to_allele: Option<AlleleType>,
    /// Translate reference positions into meta genome coordinates.
    #[arg(long, default_value_t = false)]
    pub meta: bool,
}

/// Scan the inputs for the offsets of `chromosome`.
fn collect_offsets(
    paths: &[String],
    chromosome: &str,
    cancel: &CancellationToken,
) -> Result<MultiGenome, anyhow::Error> {
    let config = ScanConfigBuilder::default()
        .scope(ScanScope::Chromosome(chromosome.to_string()))
        .build()?;
    let mut scanner = MultiFileScanner::new(paths, config).context("could not open input files")?;
    let mut collector = OffsetCollector::new(scanner.genome_list());
    let report = scanner
        .scan(&mut collector, cancel)
        .with_context(|| format!("could not scan chromosome {}", chromosome))?;
    if report.outcome == ScanOutcome::Cancelled {
        anyhow::bail!("scan cancelled");
    }

    Ok(collector.into_genomes())
}

/// Run the translation, writing one `chromosome, position, translated` row per position.
pub fn run_with_writer(writer: &mut dyn Write, args: &Args) -> Result<(), anyhow::Error> {
    let genomes = collect_offsets(&args.path_input, &args.chromosome, &CancellationToken::new())?;
    let chrom = args.chromosome.as_str();

    for position in &args.position {
        let translated = if args.meta {
            genomes.meta_translate(chrom, *position)?
        } else if let Some(to_genome) = &args.to_genome {
            let to_allele = args.to_allele.unwrap_or(args.allele);
            genomes.translate_between(
                chrom,
                (args.genome.as_str(), args.allele),
                *position,
                (to_genome.as_str(), to_allele),
            )?
        } else {
            genomes.translate(&args.genome, args.allele, chrom, *position)?
        };
        writeln!(writer, "{}\t{}\t{}", chrom, position, translated)?;
    }

    Ok(())
}

/// Main entry point for `translate` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args = {:#?}", &args);

    let stdout = std::io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    run_with_writer(&mut writer, args)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod test {
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use temp_testdir::TempDir;

    use super::{run_with_writer, Args};
    use crate::common::testing::{two_chromosome_lines, write_indexed_vcf, HEADER};

    fn translate(extra: &[&str]) -> Result<String, anyhow::Error> {
        let temp = TempDir::default();
        let path = write_indexed_vcf(&temp, "input.vcf.gz", HEADER, &two_chromosome_lines())?;
        let path = path.to_string_lossy().to_string();

        let mut argv = vec!["translate", "--path-input", path.as_str(), "--chromosome", "1"];
        argv.extend_from_slice(extra);
        let args = Args::try_parse_from(argv)?;

        let mut out = Vec::<u8>::new();
        run_with_writer(&mut out, &args)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn translate_onto_alleles() -> Result<(), anyhow::Error> {
        assert_eq!(
            translate(&[
                "--genome",
                "alpha",
                "--allele",
                "maternal",
                "--position",
                "100",
                "301",
                "400"
            ])?,
            "1\t100\t100\n1\t301\t304\n1\t400\t403\n"
        );
        assert_eq!(
            translate(&["--genome", "alpha", "--position", "150", "300"])?,
            "1\t150\t150\n1\t300\t299\n"
        );

        Ok(())
    }

    #[test]
    fn translate_between_and_meta() -> Result<(), anyhow::Error> {
        assert_eq!(
            translate(&[
                "--genome",
                "alpha",
                "--allele",
                "maternal",
                "--to-genome",
                "alpha",
                "--to-allele",
                "paternal",
                "--position",
                "304",
            ])?,
            "1\t304\t300\n"
        );
        assert_eq!(
            translate(&["--genome", "beta", "--meta", "--position", "301"])?,
            "1\t301\t304\n"
        );

        Ok(())
    }

    #[test]
    fn unknown_genome() {
        assert!(translate(&["--genome", "gamma", "--position", "1"]).is_err());
    }
}
