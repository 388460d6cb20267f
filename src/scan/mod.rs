//! Scanning of one or several VCF files, handing each data line to a receiver.

pub mod multi;
pub mod single;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thousands::Separable;

use crate::common::CancellationToken;
use crate::error::Error;
use crate::vcf::{VcfFile, VcfLine};

pub use multi::MultiFileScanner;
pub use single::SingleFileScanner;

/// Consumer of the lines of a scan.
pub trait LineReceiver {
    /// Called once per data line; an error aborts the scan.
    fn process_line(&mut self, line: &ScannedLine<'_>) -> Result<(), Error>;
}

/// One line as delivered to a [`LineReceiver`].
#[derive(Debug, Clone)]
pub struct ScannedLine<'a> {
    line: Arc<VcfLine>,
    file: &'a VcfFile,
    genomes: &'a [String],
    genome_indices: &'a [usize],
    /// Position of the line within the group of lines sharing its position.
    group_position: usize,
    group_len: usize,
}

impl<'a> ScannedLine<'a> {
    pub fn current_line(&self) -> &Arc<VcfLine> {
        &self.line
    }

    /// The file the line was read from.
    pub fn current_vcf_file(&self) -> &'a VcfFile {
        self.file
    }

    /// Names of all genomes of the scan.
    pub fn genome_list(&self) -> &'a [String] {
        self.genomes
    }

    /// Index into [`ScannedLine::genome_list`] of the sample at column `sample_idx` of the file.
    pub fn genome_index(&self, sample_idx: usize) -> Option<usize> {
        self.genome_indices.get(sample_idx).copied()
    }

    /// Name of the genome of the sample at column `sample_idx` of the file.
    pub fn genome_name(&self, sample_idx: usize) -> Option<&'a str> {
        self.genome_index(sample_idx)
            .and_then(|idx| self.genomes.get(idx))
            .map(String::as_str)
    }

    /// Whether this is the first line of its position group.
    pub fn is_group_start(&self) -> bool {
        self.group_position == 0
    }

    /// Number of lines sharing this line's chromosome and position across the scanned files.
    pub fn group_len(&self) -> usize {
        self.group_len
    }
}

/// Life cycle of a scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ScanState {
    Init,
    Scanning,
    Done,
}

/// What part of the files a scan covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanScope {
    /// All lines, read sequentially.
    #[default]
    Genome,
    /// The lines of one chromosome, read through the Tabix index.
    Chromosome(String),
}

/// Configuration of a scan.
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(pattern = "immutable")]
pub struct ScanConfig {
    /// The part of the files to scan.
    #[builder(default)]
    pub scope: ScanScope,
    /// Log progress every this many lines.
    #[builder(default = "100_000")]
    pub progress_interval: usize,
    /// Collect malformed lines in the report instead of failing.
    #[builder(default = "true")]
    pub collect_line_errors: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scope: ScanScope::Genome,
            progress_interval: 100_000,
            collect_line_errors: true,
        }
    }
}

/// How a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ScanOutcome {
    Completed,
    Cancelled,
}

/// A line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    pub path: PathBuf,
    pub line_number: usize,
    pub message: String,
}

/// Result of a scan that was not aborted by an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    /// Number of lines handed to the receiver.
    pub lines_processed: usize,
    pub line_errors: Vec<LineError>,
}

/// Common interface of the scanners.
pub trait Scanner {
    /// Names of the genomes covered by the scan.
    fn genome_list(&self) -> &[String];

    fn state(&self) -> ScanState;

    /// Run the scan, handing each line to `receiver`.
    ///
    /// All readers are closed when this returns, whatever the outcome.
    fn scan(
        &mut self,
        receiver: &mut dyn LineReceiver,
        cancel: &CancellationToken,
    ) -> Result<ScanReport, Error>;

    /// Close all readers.
    fn end_scan(&mut self);
}

/// Bookkeeping shared by the scanners.
#[derive(Debug)]
struct ScanProgress {
    collect_line_errors: bool,
    progress_interval: usize,
    lines_processed: usize,
    line_errors: Vec<LineError>,
}

impl ScanProgress {
    fn new(config: &ScanConfig) -> Self {
        Self {
            collect_line_errors: config.collect_line_errors,
            progress_interval: config.progress_interval.max(1),
            lines_processed: 0,
            line_errors: Vec::new(),
        }
    }

    /// Parse a line, keeping malformed lines in the report.
    fn parse_line(
        &mut self,
        path: &Path,
        text: &str,
        line_number: usize,
    ) -> Result<Option<VcfLine>, Error> {
        match VcfLine::parse(text, line_number) {
            Ok(line) => Ok(Some(line)),
            Err(Error::MalformedLine {
                line_number,
                message,
            }) if self.collect_line_errors => {
                tracing::debug!("{}:{}: {}", path.display(), line_number, &message);
                self.line_errors.push(LineError {
                    path: path.to_path_buf(),
                    line_number,
                    message,
                });
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn line_processed(&mut self) {
        self.lines_processed += 1;
        if self.lines_processed % self.progress_interval == 0 {
            tracing::info!(
                "... processed {} lines",
                self.lines_processed.separate_with_commas()
            );
        }
    }

    fn into_report(self, outcome: ScanOutcome) -> ScanReport {
        if self.line_errors.is_empty() {
            tracing::info!(
                "Scan {} after {} lines",
                outcome,
                self.lines_processed.separate_with_commas()
            );
        } else {
            tracing::warn!(
                "Scan {} after {} lines, {} malformed line(s) skipped, first: {}:{}: {}",
                outcome,
                self.lines_processed.separate_with_commas(),
                self.line_errors.len().separate_with_commas(),
                self.line_errors[0].path.display(),
                self.line_errors[0].line_number,
                &self.line_errors[0].message
            );
        }
        ScanReport {
            outcome,
            lines_processed: self.lines_processed,
            line_errors: self.line_errors,
        }
    }
}

/// Error for scanners used after their scan.
fn scan_finished() -> Error {
    Error::Io(std::io::Error::other("scan already ran"))
}
