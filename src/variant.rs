//! Typed variants of one genome allele, as shown on tracks.

use std::sync::Arc;

use crate::error::Error;
use crate::sync::{offset_length, AlleleType, MultiGenome};
use crate::vcf::VcfLine;

/// Kind of a variant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    parse_display::Display,
    parse_display::FromStr,
    serde::Serialize,
    serde::Deserialize,
)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VariantType {
    Snp,
    Insertion,
    Deletion,
    StructuralVariant,
    Reference,
    NoCall,
}

/// A variant on one allele of one genome.
///
/// The variant refers to the line it was derived from; INFO values are parsed on the line when
/// first needed.
#[derive(Debug, Clone)]
pub struct Variant {
    variant_type: VariantType,
    genome_name: String,
    allele: AlleleType,
    /// 1-based index into ALT, `None` for reference and no-calls.
    alt_index: Option<usize>,
    /// Start on the genome allele.
    start: i32,
    /// Exclusive stop on the genome allele.
    stop: i32,
    line: Arc<VcfLine>,
}

impl Variant {
    /// Derive the variant of `genome_name`/`allele` from the genotype in column `sample_idx`.
    ///
    /// Coordinates are translated through the offsets of that allele.
    pub fn from_line(
        line: Arc<VcfLine>,
        sample_idx: usize,
        genome_name: &str,
        allele: AlleleType,
        genomes: &MultiGenome,
    ) -> Result<Self, Error> {
        let called = line
            .genotype(sample_idx)
            .and_then(|genotype| genotype.allele(allele.slot()));
        let variant_type = match called {
            None => VariantType::NoCall,
            Some(0) => VariantType::Reference,
            Some(idx) => match line.alternative(idx) {
                None => VariantType::NoCall,
                Some(alt) if alt.starts_with('<') || alt.contains(['[', ']']) => {
                    VariantType::StructuralVariant
                }
                Some(alt) => match offset_length(&line, alt) {
                    Some(length) if length > 0 => VariantType::Insertion,
                    Some(_) => VariantType::Deletion,
                    None => VariantType::Snp,
                },
            },
        };
        let alt_index = called.filter(|idx| *idx > 0);

        let chrom = line.chromosome();
        let start = genomes.translate(genome_name, allele, chrom, line.position())?;
        let last = genomes.translate(genome_name, allele, chrom, line.end() - 1)?;
        let stop = match alt_index.and_then(|idx| line.alternative(idx)) {
            Some(alt) if variant_type == VariantType::Insertion => {
                start.saturating_add(i32::try_from(alt.len()).unwrap_or(i32::MAX))
            }
            _ => std::cmp::max(start, last).saturating_add(1),
        };

        Ok(Self {
            variant_type,
            genome_name: genome_name.to_string(),
            allele,
            alt_index,
            start,
            stop,
            line,
        })
    }

    pub fn variant_type(&self) -> VariantType {
        self.variant_type
    }

    pub fn genome_name(&self) -> &str {
        &self.genome_name
    }

    pub fn allele(&self) -> AlleleType {
        self.allele
    }

    pub fn alt_index(&self) -> Option<usize> {
        self.alt_index
    }

    pub fn chromosome(&self) -> &str {
        self.line.chromosome()
    }

    /// Position on the reference genome.
    pub fn reference_position(&self) -> i32 {
        self.line.position()
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn stop(&self) -> i32 {
        self.stop
    }

    pub fn length(&self) -> i32 {
        self.stop - self.start
    }

    /// The line the variant was derived from.
    pub fn line(&self) -> &Arc<VcfLine> {
        &self.line
    }
}
