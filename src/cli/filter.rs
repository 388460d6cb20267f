//! Writing the lines of a VCF file that pass a filter set.

use clap::Parser;

use crate::common::CancellationToken;
use crate::export::export_filtered;
use crate::filter::FilterSet;
use crate::scan::{ScanConfigBuilder, ScanOutcome, ScanScope};

/// Command line arguments for `filter` sub command.
#[derive(Parser, Debug)]
#[command(about = "Write the VCF lines passing all filters of a filter set", long_about = None)]
pub struct Args {
    /// Path to the input VCF file.
    #[arg(long)]
    pub path_input: String,
    /// Path to the YAML file with the filters.
    #[arg(long)]
    pub path_filters: String,
    /// Path to the output VCF file, bgzip compressed if ending in `.gz`.
    #[arg(long)]
    pub path_output: String,
    /// Restrict to one chromosome, needs a Tabix index.
    #[arg(long)]
    pub chromosome: Option<String>,
    /// Fail on malformed lines instead of skipping them.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

/// Main entry point for `filter` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args = {:#?}", &args);

    let filters = FilterSet::from_path(&args.path_filters)?;
    filters.validate()?;
    for filter in filters.filters() {
        tracing::info!("  filter: {}", filter.description());
    }

    let config = ScanConfigBuilder::default()
        .scope(
            args.chromosome
                .clone()
                .map(ScanScope::Chromosome)
                .unwrap_or_default(),
        )
        .collect_line_errors(!args.strict)
        .build()?;
    let report = export_filtered(
        &args.path_input,
        &args.path_output,
        &filters,
        config,
        &CancellationToken::new(),
    )?;
    if report.scan.outcome == ScanOutcome::Cancelled {
        anyhow::bail!("filtering cancelled");
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use clap_verbosity_flag::Verbosity;
    use pretty_assertions::assert_eq;
    use temp_testdir::TempDir;

    use super::{run, Args};
    use crate::common::testing::{two_chromosome_lines, write_indexed_vcf, HEADER};

    const FILTERS: &str = "
- header_id:
    column: INFO
    id: DP
  kind:
    type: numeric
    first: '>=14'
- header_id:
    column: FILTER
    id: FILTER
  kind:
    type: text
    value: PASS
    required: true
";

    fn args(temp: &TempDir, chromosome: Option<&str>) -> Result<Args, anyhow::Error> {
        let path_input = write_indexed_vcf(temp, "input.vcf.gz", HEADER, &two_chromosome_lines())?;
        let path_filters = temp.join("filters.yaml");
        std::fs::write(&path_filters, FILTERS)?;
        Ok(Args {
            path_input: path_input.to_string_lossy().to_string(),
            path_filters: path_filters.to_string_lossy().to_string(),
            path_output: temp.join("output.vcf").to_string_lossy().to_string(),
            chromosome: chromosome.map(str::to_string),
            strict: false,
        })
    }

    #[rstest::rstest]
    #[case(None, &[0, 1, 3, 4])]
    #[case(Some("1"), &[0, 1])]
    fn smoke_test(
        #[case] chromosome: Option<&str>,
        #[case] expected: &[usize],
    ) -> Result<(), anyhow::Error> {
        let temp = TempDir::default();
        let args = args(&temp, chromosome)?;
        let args_common = crate::common::Args {
            verbose: Verbosity::new(0, 1),
        };

        run(&args_common, &args)?;

        let lines = two_chromosome_lines();
        let expected = expected
            .iter()
            .fold(HEADER.to_string(), |text, idx| text + &lines[*idx] + "\n");
        assert_eq!(std::fs::read_to_string(&args.path_output)?, expected);

        Ok(())
    }

    #[test]
    fn invalid_filters() -> Result<(), anyhow::Error> {
        let temp = TempDir::default();
        let args = args(&temp, None)?;
        std::fs::write(&args.path_filters, "- kind:\n    type: text\n")?;

        assert!(run(&crate::common::Args::default(), &args).is_err());
        assert!(!std::path::Path::new(&args.path_output).exists());

        Ok(())
    }
}
