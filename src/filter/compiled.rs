//! Filters compiled into per-chromosome result tables.

use crate::common::CancellationToken;
use crate::error::Error;
use crate::tabix::TabixReader;
use crate::variant::Variant;
use crate::vcf::VcfLine;

use super::kind::IdFilter;

/// The results of an [`IdFilter`] over all records of one chromosome.
///
/// Positions are the reference positions of the records, sorted ascending.  Records sharing a
/// position are merged: the position passes if any of them passes.
#[derive(Debug, Clone, PartialEq)]
pub struct VcfFilter {
    filter: IdFilter,
    chromosome: String,
    positions: Vec<i32>,
    results: Vec<bool>,
}

impl VcfFilter {
    /// Evaluate `filter` on every record of `chromosome` read through `reader`.
    ///
    /// Returns `Ok(None)` when `cancel` is set before all records were seen.
    pub fn generate(
        filter: &IdFilter,
        reader: &mut TabixReader,
        chromosome: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Self>, Error> {
        if let Some(errors) = filter.errors() {
            return Err(Error::InvalidFilter(errors));
        }

        let header = reader.header().clone();
        let mut positions: Vec<i32> = Vec::new();
        let mut results: Vec<bool> = Vec::new();
        let mut skipped = 0usize;

        for record in reader.query(chromosome, 1, i32::MAX)? {
            if cancel.is_cancelled() {
                tracing::debug!(
                    "Compiling filter {} on {} cancelled",
                    filter.description(),
                    chromosome
                );
                return Ok(None);
            }
            let line = match record {
                Ok(line) => line,
                Err(e) if e.is_recoverable() => {
                    tracing::trace!("skipping record: {}", e);
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let passed = filter.is_valid_line(&line, &header);
            match positions.last() {
                Some(last) if *last == line.position() => {
                    if let Some(result) = results.last_mut() {
                        *result |= passed;
                    }
                }
                _ => {
                    positions.push(line.position());
                    results.push(passed);
                }
            }
        }

        if skipped > 0 {
            tracing::warn!(
                "{} malformed record(s) on {} not considered by filter",
                skipped,
                chromosome
            );
        }
        tracing::debug!(
            "Compiled filter {} on {}: {} of {} position(s) pass",
            filter.description(),
            chromosome,
            results.iter().filter(|passed| **passed).count(),
            positions.len()
        );

        Ok(Some(Self {
            filter: filter.clone(),
            chromosome: chromosome.to_string(),
            positions,
            results,
        }))
    }

    pub fn filter(&self) -> &IdFilter {
        &self.filter
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    /// Number of distinct positions.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Result at a reference position; unknown positions do not pass.
    pub fn is_valid_position(&self, position: i32) -> bool {
        self.positions
            .binary_search(&position)
            .ok()
            .and_then(|idx| self.results.get(idx).copied())
            .unwrap_or(false)
    }

    /// Result for the record a variant was derived from.
    ///
    /// This is the merged result of its position, see [`VcfFilter::is_valid_line`].
    pub fn is_valid(&self, variant: &Variant) -> bool {
        variant.chromosome() == self.chromosome
            && self.is_valid_position(variant.reference_position())
    }

    /// Result for a line of the chromosome.
    ///
    /// Lookups go by position, so a line passes when any record at its position passed, even if
    /// the filter rejects this very line.  Use [`IdFilter::is_valid_line`] for the per-line
    /// decision.
    pub fn is_valid_line(&self, line: &VcfLine) -> bool {
        line.chromosome() == self.chromosome && self.is_valid_position(line.position())
    }
}
