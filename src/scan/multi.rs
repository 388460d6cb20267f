//! Synchronized scan of several VCF files by reference position.

use std::path::Path;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use super::{
    scan_finished, LineReceiver, ScanConfig, ScanOutcome, ScanProgress, ScanReport, ScanScope,
    ScanState, ScannedLine, Scanner,
};
use crate::common::{trace_rss_now, CancellationToken};
use crate::error::Error;
use crate::tabix::TabixReader;
use crate::vcf::{VcfFile, VcfLine};

/// One input file of the scan together with its next line.
#[derive(Debug)]
struct Input {
    file: VcfFile,
    reader: TabixReader,
    /// Maps sample columns of the file to global genome indices.
    genome_indices: Vec<usize>,
    /// The next line to deliver, `None` once the file is exhausted.
    next: Option<Arc<VcfLine>>,
}

impl Input {
    /// Read the next well-formed line into `next`.
    fn advance(&mut self, progress: &mut ScanProgress) -> Result<(), Error> {
        self.next = None;
        while self.reader.go_next_line()? {
            let text = self.reader.current_line().unwrap_or_default();
            if let Some(line) =
                progress.parse_line(&self.file.path, text, self.reader.line_number())?
            {
                self.next = Some(Arc::new(line));
                break;
            }
        }
        Ok(())
    }
}

/// Scanner advancing several readers in lock-step.
///
/// In each step, the lines at the smallest `(chromosome, position)` over all readers are
/// delivered in file order and exactly those readers advance.  Chromosomes are ordered as
/// declared by the headers and indices of the files, unknown chromosomes after those in the
/// order they are seen.
#[derive(Debug)]
pub struct MultiFileScanner {
    config: ScanConfig,
    inputs: Vec<Input>,
    genomes: Vec<String>,
    /// Rank of each chromosome name.
    chrom_ranks: IndexMap<String, usize>,
    state: ScanState,
}

impl MultiFileScanner {
    /// Open all files; failing to open any of them is fatal.
    pub fn new<P>(paths: &[P], config: ScanConfig) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let mut genomes = IndexSet::new();
        let mut chrom_ranks = IndexMap::new();
        let mut inputs = Vec::with_capacity(paths.len());
        for (index, path) in paths.iter().enumerate() {
            let reader = TabixReader::open(path.as_ref())?;
            let header = reader.header().clone();

            let genome_indices = header
                .sample_names()
                .iter()
                .map(|name| genomes.insert_full(name.clone()).0)
                .collect();
            let index_names = reader
                .index()
                .map(|index| index.names().to_vec())
                .unwrap_or_default();
            for name in header.contig_names().into_iter().chain(index_names) {
                let rank = chrom_ranks.len();
                chrom_ranks.entry(name).or_insert(rank);
            }

            inputs.push(Input {
                file: VcfFile::new(index, path.as_ref(), header),
                reader,
                genome_indices,
                next: None,
            });
        }

        Ok(Self {
            config,
            inputs,
            genomes: genomes.into_iter().collect(),
            chrom_ranks,
            state: ScanState::Init,
        })
    }

    /// The files of the scan in input order.
    pub fn files(&self) -> impl Iterator<Item = &VcfFile> {
        self.inputs.iter().map(|input| &input.file)
    }

    /// Restrict every reader to `chrom`.
    ///
    /// Files whose index lacks the chromosome contribute no lines; it is an error only if no
    /// file knows the chromosome.
    fn seek_chromosome(&mut self, chrom: &str) -> Result<(), Error> {
        let mut found = false;
        for input in self.inputs.iter_mut() {
            match input.reader.seek_region(chrom, 1, i32::MAX) {
                Ok(()) => found = true,
                Err(Error::InvalidChromosome(_)) => {
                    tracing::debug!("{:?} has no lines on {}", &input.file.path, chrom);
                    input.reader.close();
                }
                Err(err) => return Err(err),
            }
        }
        if found {
            Ok(())
        } else {
            Err(Error::InvalidChromosome(chrom.to_string()))
        }
    }

    /// Sort key of a line.
    fn key(&mut self, line: &VcfLine) -> (usize, i32) {
        let rank = self.chrom_ranks.len();
        let rank = *self
            .chrom_ranks
            .entry(line.chromosome().to_string())
            .or_insert(rank);
        (rank, line.position())
    }

    /// Indices of the inputs whose next line sits at the smallest key.
    fn next_group(&mut self) -> Vec<usize> {
        let mut group = Vec::new();
        let mut min_key = None;
        for idx in 0..self.inputs.len() {
            let Some(line) = self.inputs[idx].next.clone() else {
                continue;
            };
            let key = self.key(&line);
            match min_key {
                Some(min) if key > min => (),
                Some(min) if key == min => group.push(idx),
                _ => {
                    min_key = Some(key);
                    group.clear();
                    group.push(idx);
                }
            }
        }
        group
    }

    fn run(
        &mut self,
        receiver: &mut dyn LineReceiver,
        cancel: &CancellationToken,
        progress: &mut ScanProgress,
    ) -> Result<ScanOutcome, Error> {
        if let ScanScope::Chromosome(chrom) = self.config.scope.clone() {
            tracing::info!(
                "Scanning chromosome {} of {} files",
                &chrom,
                self.inputs.len()
            );
            self.seek_chromosome(&chrom)?;
        } else {
            tracing::info!("Scanning {} files", self.inputs.len());
        }

        for input in self.inputs.iter_mut() {
            if !input.reader.is_closed() {
                input.advance(progress)?;
            }
        }

        loop {
            let group = self.next_group();
            if group.is_empty() {
                return Ok(ScanOutcome::Completed);
            }

            for (group_position, &idx) in group.iter().enumerate() {
                if cancel.is_cancelled() {
                    tracing::info!("Synchronized scan cancelled");
                    return Ok(ScanOutcome::Cancelled);
                }
                let input = &self.inputs[idx];
                let Some(line) = input.next.clone() else {
                    continue;
                };
                receiver.process_line(&ScannedLine {
                    line,
                    file: &input.file,
                    genomes: &self.genomes,
                    genome_indices: &input.genome_indices,
                    group_position,
                    group_len: group.len(),
                })?;
                progress.line_processed();
            }

            for idx in group {
                self.inputs[idx].advance(progress)?;
            }
        }
    }
}

impl Scanner for MultiFileScanner {
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
        for input in self.inputs.iter_mut() {
            input.reader.close();
            input.next = None;
        }
        self.state = ScanState::Done;
    }
}

impl Drop for MultiFileScanner {
    fn drop(&mut self) {
        for input in self.inputs.iter_mut() {
            input.reader.close();
        }
    }
}
