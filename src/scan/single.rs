//! Sequential scan of a single VCF file.

use std::path::Path;
use std::sync::Arc;

use super::{
    scan_finished, LineReceiver, ScanConfig, ScanOutcome, ScanProgress, ScanReport, ScanScope,
    ScanState, ScannedLine, Scanner,
};
use crate::common::{trace_rss_now, CancellationToken};
use crate::error::Error;
use crate::tabix::TabixReader;
use crate::vcf::VcfFile;

/// Scanner advancing one reader until its end.
#[derive(Debug)]
pub struct SingleFileScanner {
    config: ScanConfig,
    file: VcfFile,
    reader: TabixReader,
    genomes: Vec<String>,
    genome_indices: Vec<usize>,
    state: ScanState,
}

impl SingleFileScanner {
    /// Open the file at `path`; failing to open it is fatal.
    pub fn new<P>(path: P, config: ScanConfig) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let reader = TabixReader::open(path.as_ref())?;
        let file = VcfFile::new(0, path.as_ref(), reader.header().clone());
        let genomes = reader.header().sample_names().to_vec();
        let genome_indices = (0..genomes.len()).collect();
        Ok(Self {
            config,
            file,
            reader,
            genomes,
            genome_indices,
            state: ScanState::Init,
        })
    }

    pub fn file(&self) -> &VcfFile {
        &self.file
    }

    fn run(
        &mut self,
        receiver: &mut dyn LineReceiver,
        cancel: &CancellationToken,
        progress: &mut ScanProgress,
    ) -> Result<ScanOutcome, Error> {
        if let ScanScope::Chromosome(chrom) = &self.config.scope {
            tracing::info!("Scanning chromosome {} of {:?}", chrom, &self.file.path);
            self.reader.seek_region(chrom, 1, i32::MAX)?;
        } else {
            tracing::info!("Scanning {:?}", &self.file.path);
        }

        loop {
            if cancel.is_cancelled() {
                tracing::info!("Scan of {:?} cancelled", &self.file.path);
                return Ok(ScanOutcome::Cancelled);
            }
            if !self.reader.go_next_line()? {
                return Ok(ScanOutcome::Completed);
            }
            let text = self.reader.current_line().unwrap_or_default();
            let Some(line) =
                progress.parse_line(&self.file.path, text, self.reader.line_number())?
            else {
                continue;
            };

            receiver.process_line(&ScannedLine {
                line: Arc::new(line),
                file: &self.file,
                genomes: &self.genomes,
                genome_indices: &self.genome_indices,
                group_position: 0,
                group_len: 1,
            })?;
            progress.line_processed();
        }
    }
}

impl Scanner for SingleFileScanner {
    fn genome_list(&self) -> &[String] {
        &self.genomes
    }

    fn state(&self) -> ScanState {
        self.state
    }

    fn scan(
        &mut self,
        receiver: &mut dyn LineReceiver,
        cancel: &CancellationToken,
    ) -> Result<ScanReport, Error> {
        if self.state != ScanState::Init {
            return Err(scan_finished());
        }
        self.state = ScanState::Scanning;

        let mut progress = ScanProgress::new(&self.config);
        let result = self.run(receiver, cancel, &mut progress);
        self.end_scan();

        let outcome = result?;
        trace_rss_now();
        Ok(progress.into_report(outcome))
    }

    fn end_scan(&mut self) {
        self.reader.close();
        self.state = ScanState::Done;
    }
}

impl Drop for SingleFileScanner {
    fn drop(&mut self) {
        self.reader.close();
    }
}
