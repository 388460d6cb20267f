//! Genomes with their two alleles.

use indexmap::IndexMap;

use super::allele::MgAllele;
use crate::error::Error;

/// The two alleles of a diploid genome.
///
/// The paternal allele is the first index of a GT value, the maternal one the second.  Haploid
/// calls only affect the paternal allele.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    clap::ValueEnum,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AlleleType {
    Paternal,
    Maternal,
}

impl AlleleType {
    /// Index of the allele within a GT value.
    pub fn slot(&self) -> usize {
        match self {
            AlleleType::Paternal => 0,
            AlleleType::Maternal => 1,
        }
    }

    /// Allele for a GT slot, `None` beyond the second.
    pub fn from_slot(slot: usize) -> Option<Self> {
        match slot {
            0 => Some(AlleleType::Paternal),
            1 => Some(AlleleType::Maternal),
            _ => None,
        }
    }
}

/// A named genome owning exactly two alleles on each chromosome.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MgGenome {
    name: String,
    chromosomes: IndexMap<String, [MgAllele; 2]>,
}

impl MgGenome {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            chromosomes: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the chromosomes with offsets.
    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.chromosomes.keys().map(String::as_str)
    }

    /// The allele on `chromosome`, `None` if nothing was recorded there.
    pub fn allele(&self, chromosome: &str, allele: AlleleType) -> Option<&MgAllele> {
        self.chromosomes
            .get(chromosome)
            .map(|alleles| &alleles[allele.slot()])
    }

    pub fn allele_mut(&mut self, chromosome: &str, allele: AlleleType) -> &mut MgAllele {
        &mut self
            .chromosomes
            .entry(chromosome.to_string())
            .or_default()[allele.slot()]
    }

    /// All alleles by chromosome.
    pub fn alleles(&self) -> impl Iterator<Item = (&str, AlleleType, &MgAllele)> {
        self.chromosomes.iter().flat_map(|(chrom, alleles)| {
            alleles.iter().enumerate().filter_map(move |(slot, allele)| {
                AlleleType::from_slot(slot)
                    .map(|allele_type| (chrom.as_str(), allele_type, allele))
            })
        })
    }

    /// Translate through the allele on `chromosome`; chromosomes without offsets are unchanged.
    pub fn translate(
        &self,
        chromosome: &str,
        allele: AlleleType,
        position: i32,
    ) -> Result<i32, Error> {
        match self.allele(chromosome, allele) {
            Some(allele) => allele.translate(position),
            None => Ok(position),
        }
    }

    /// Inverse of [`MgGenome::translate`].
    pub fn translate_back(
        &self,
        chromosome: &str,
        allele: AlleleType,
        position: i32,
    ) -> Result<i32, Error> {
        match self.allele(chromosome, allele) {
            Some(allele) => allele.translate_back(position),
            None => Ok(position),
        }
    }

    /// Sort and compact all alleles.
    pub fn finalize(&mut self) {
        for alleles in self.chromosomes.values_mut() {
            for allele in alleles.iter_mut() {
                allele.sort();
                allele.compact();
            }
        }
    }
}
