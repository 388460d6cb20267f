//! Export of the lines passing a filter set.

use std::io::Write;
use std::path::Path;

use anyhow::Context;

use crate::common::io::std::write_atomically;
use crate::common::CancellationToken;
use crate::error::Error;
use crate::filter::FilterSet;
use crate::scan::{
    LineReceiver, ScanConfig, ScanOutcome, ScanReport, ScannedLine, Scanner, SingleFileScanner,
};

/// Result of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// The report of the underlying scan.
    pub scan: ScanReport,
    /// Number of data lines written.
    pub lines_written: usize,
    /// Whether the output file was created; `false` after cancellation.
    pub written: bool,
}

/// Receiver writing the raw text of each passing line.
struct FilteredWriter<'a> {
    out: &'a mut dyn Write,
    filters: &'a FilterSet,
    lines_written: usize,
}

impl LineReceiver for FilteredWriter<'_> {
    fn process_line(&mut self, line: &ScannedLine<'_>) -> Result<(), Error> {
        let header = &line.current_vcf_file().header;
        if self.filters.is_valid_line(line.current_line(), header) {
            writeln!(self.out, "{}", line.current_line().raw())?;
            self.lines_written += 1;
        }
        Ok(())
    }
}

/// Write the header of `path_input` and every line passing `filters` to `path_output`.
///
/// The output is bgzip compressed if its name ends in `.gz`.  If the export fails or is
/// cancelled, no file is left at `path_output`.
pub fn export_filtered<P, Q>(
    path_input: P,
    path_output: Q,
    filters: &FilterSet,
    config: ScanConfig,
    cancel: &CancellationToken,
) -> Result<ExportReport, anyhow::Error>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    filters.validate()?;
    let mut scanner = SingleFileScanner::new(path_input.as_ref(), config)
        .with_context(|| format!("could not open {:?}", path_input.as_ref()))?;
    for problem in filters.undeclared_ids(&scanner.file().header) {
        tracing::warn!("{}", problem);
    }

    let mut result = None;
    let written = write_atomically(path_output.as_ref(), |out| {
        out.write_all(scanner.file().header.text().as_bytes())?;
        let mut receiver = FilteredWriter {
            out,
            filters,
            lines_written: 0,
        };
        let report = scanner.scan(&mut receiver, cancel)?;
        let keep = report.outcome == ScanOutcome::Completed;
        result = Some((report, receiver.lines_written));
        Ok(keep)
    })
    .with_context(|| format!("could not export to {:?}", path_output.as_ref()))?;

    let (scan, lines_written) =
        result.ok_or_else(|| anyhow::anyhow!("export finished without scan report"))?;
    if written {
        tracing::info!(
            "Wrote {} of {} line(s) to {:?}",
            lines_written,
            scan.lines_processed,
            path_output.as_ref()
        );
    } else {
        tracing::warn!("Export cancelled, removed {:?}", path_output.as_ref());
    }

    Ok(ExportReport {
        scan,
        lines_written,
        written,
    })
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::testing::{
        read_text, two_chromosome_lines, write_indexed_vcf, write_plain_vcf, HEADER,
    };
    use crate::scan::{LineError, ScanConfigBuilder, ScanScope};

    fn quality_filters() -> FilterSet {
        FilterSet::from_yaml(
            r#"
- header_id:
    column: QUAL
    id: QUAL
  kind:
    type: numeric
    first: ">=30"
"#,
        )
        .unwrap()
    }

    #[rstest::rstest]
    #[case("out.vcf")]
    #[case("out.vcf.gz")]
    fn export_passing_lines(#[case] filename: &str) -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let lines = two_chromosome_lines();
        let input = write_indexed_vcf(&tmp_dir, "in.vcf.gz", HEADER, &lines)?;
        let output = tmp_dir.join(filename);

        let report = export_filtered(
            &input,
            &output,
            &quality_filters(),
            ScanConfig::default(),
            &CancellationToken::new(),
        )?;

        assert!(report.written);
        assert_eq!(report.lines_written, 4);
        assert_eq!(report.scan.lines_processed, 5);
        let expected = format!(
            "{}{}\n{}\n{}\n{}\n",
            HEADER, lines[0], lines[1], lines[3], lines[4]
        );
        assert_eq!(read_text(&output)?, expected);

        Ok(())
    }

    #[test]
    fn export_chromosome() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let lines = two_chromosome_lines();
        let input = write_indexed_vcf(&tmp_dir, "in.vcf.gz", HEADER, &lines)?;
        let output = tmp_dir.join("out.vcf");
        let config = ScanConfigBuilder::default()
            .scope(ScanScope::Chromosome("2".to_string()))
            .build()?;

        let report = export_filtered(
            &input,
            &output,
            &quality_filters(),
            config,
            &CancellationToken::new(),
        )?;

        assert_eq!(report.lines_written, 2);
        assert_eq!(
            read_text(&output)?,
            format!("{}{}\n{}\n", HEADER, lines[3], lines[4])
        );

        Ok(())
    }

    #[test]
    fn cancelled_export_leaves_no_output() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let input = write_indexed_vcf(&tmp_dir, "in.vcf.gz", HEADER, &two_chromosome_lines())?;
        let output = tmp_dir.join("out.vcf");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = export_filtered(
            &input,
            &output,
            &quality_filters(),
            ScanConfig::default(),
            &cancel,
        )?;

        assert!(!report.written);
        assert_eq!(report.scan.outcome, ScanOutcome::Cancelled);
        assert!(!output.exists());
        assert_eq!(std::fs::read_dir(&*tmp_dir)?.count(), 2);

        Ok(())
    }

    #[test]
    fn failed_export_leaves_no_output() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let mut lines = two_chromosome_lines();
        lines.insert(1, "1\tnot-a-position\t.\tA\tG\t.\t.\t.".to_string());
        let input = tmp_dir.join("in.vcf");
        write_plain_vcf(&input, HEADER, &lines)?;
        let output = tmp_dir.join("out.vcf");

        let strict = ScanConfigBuilder::default()
            .collect_line_errors(false)
            .build()?;
        let result = export_filtered(
            &input,
            &output,
            &quality_filters(),
            strict,
            &CancellationToken::new(),
        );
        assert!(result.is_err());
        assert!(!output.exists());

        let report = export_filtered(
            &input,
            &output,
            &quality_filters(),
            ScanConfig::default(),
            &CancellationToken::new(),
        )?;
        assert_eq!(
            report.scan.line_errors.iter().map(|e| e.line_number).collect::<Vec<_>>(),
            vec![HEADER.lines().count() + 2]
        );
        assert!(report
            .scan
            .line_errors
            .iter()
            .all(|e: &LineError| e.path == input));
        assert_eq!(report.lines_written, 4);

        Ok(())
    }

    #[test]
    fn incomplete_filters_are_rejected() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let input = write_indexed_vcf(&tmp_dir, "in.vcf.gz", HEADER, &two_chromosome_lines())?;
        let output = tmp_dir.join("out.vcf");
        let filters = FilterSet::from_yaml("- kind:\n    type: flag\n")?;

        let result = export_filtered(
            &input,
            &output,
            &filters,
            ScanConfig::default(),
            &CancellationToken::new(),
        );
        assert!(result.is_err());
        assert!(!output.exists());

        Ok(())
    }
}
