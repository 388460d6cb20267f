//! Synchronization of genome coordinates through the indels recorded in VCF files.

pub mod allele;
pub mod genome;
pub mod offset;

use indexmap::IndexMap;
use thousands::Separable;

pub use allele::MgAllele;
pub use genome::{AlleleType, MgGenome};
pub use offset::MgOffset;

use crate::error::Error;
use crate::scan::{LineReceiver, ScannedLine};
use crate::vcf::VcfLine;

/// The genomes of a project with the offsets of their alleles.
///
/// A `MultiGenome` is filled while scanning and then finalized once; afterwards it is only
/// read and may be shared between threads.  Translation is only possible once finalized.
#[derive(Debug, Clone, Default)]
pub struct MultiGenome {
    genomes: IndexMap<String, MgGenome>,
    /// Largest insertion at each reference position over all alleles, by chromosome.
    meta: IndexMap<String, MgAllele>,
    finalized: bool,
}

impl MultiGenome {
    /// Create with the given genome names, in order.
    pub fn new<S>(names: &[S]) -> Self
    where
        S: AsRef<str>,
    {
        Self {
            genomes: names
                .iter()
                .map(|name| (name.as_ref().to_string(), MgGenome::new(name.as_ref())))
                .collect(),
            meta: IndexMap::new(),
            finalized: false,
        }
    }

    pub fn genome_names(&self) -> impl Iterator<Item = &str> {
        self.genomes.keys().map(String::as_str)
    }

    pub fn genome(&self, name: &str) -> Result<&MgGenome, Error> {
        self.genomes
            .get(name)
            .ok_or_else(|| Error::UnknownGenome(name.to_string()))
    }

    /// Record an offset on one allele of a genome.
    pub fn add_offset(
        &mut self,
        genome: &str,
        allele: AlleleType,
        chromosome: &str,
        offset: MgOffset,
    ) -> Result<(), Error> {
        self.genomes
            .get_mut(genome)
            .ok_or_else(|| Error::UnknownGenome(genome.to_string()))?
            .allele_mut(chromosome, allele)
            .push(offset);
        self.finalized = false;
        Ok(())
    }

    /// Sort and compact all alleles and compute the meta genome.
    pub fn finalize(&mut self) {
        let mut insertions: IndexMap<String, IndexMap<i32, i32>> = IndexMap::new();
        let mut offset_count = 0;
        for genome in self.genomes.values_mut() {
            genome.finalize();
            for (chrom, _, allele) in genome.alleles() {
                offset_count += allele.len();
                let chrom_insertions = insertions.entry(chrom.to_string()).or_default();
                for offset in allele.offsets().iter().filter(|offset| offset.value > 0) {
                    let entry = chrom_insertions.entry(offset.position).or_insert(0);
                    *entry = std::cmp::max(*entry, offset.value);
                }
            }
        }
        self.meta = insertions
            .into_iter()
            .map(|(chrom, chrom_insertions)| {
                let offsets = chrom_insertions
                    .into_iter()
                    .map(|(position, value)| MgOffset::new(position, value))
                    .collect();
                (chrom, MgAllele::from_offsets(offsets))
            })
            .collect();
        self.finalized = true;

        tracing::info!(
            "Synchronized {} genomes with {} offsets, {} meta genome insertions",
            self.genomes.len(),
            offset_count.separate_with_commas(),
            self.meta
                .values()
                .map(MgAllele::len)
                .sum::<usize>()
                .separate_with_commas()
        );
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn ready_genome(&self, name: &str) -> Result<&MgGenome, Error> {
        if !self.finalized {
            return Err(Error::OffsetsNotCompacted);
        }
        self.genome(name)
    }

    /// Translate a reference position onto an allele of a genome.
    pub fn translate(
        &self,
        genome: &str,
        allele: AlleleType,
        chromosome: &str,
        position: i32,
    ) -> Result<i32, Error> {
        self.ready_genome(genome)?
            .translate(chromosome, allele, position)
    }

    /// Translate a position on an allele of a genome back onto the reference.
    pub fn translate_back(
        &self,
        genome: &str,
        allele: AlleleType,
        chromosome: &str,
        position: i32,
    ) -> Result<i32, Error> {
        self.ready_genome(genome)?
            .translate_back(chromosome, allele, position)
    }

    /// Translate a position from one genome allele onto another, through the reference.
    pub fn translate_between(
        &self,
        chromosome: &str,
        from: (&str, AlleleType),
        position: i32,
        to: (&str, AlleleType),
    ) -> Result<i32, Error> {
        let reference = self.translate_back(from.0, from.1, chromosome, position)?;
        self.translate(to.0, to.1, chromosome, reference)
    }

    /// The meta genome allele of `chromosome`, if any genome has insertions there.
    pub fn meta(&self, chromosome: &str) -> Option<&MgAllele> {
        self.meta.get(chromosome)
    }

    /// Translate a reference position into meta genome coordinates.
    pub fn meta_translate(&self, chromosome: &str, position: i32) -> Result<i32, Error> {
        if !self.finalized {
            return Err(Error::OffsetsNotCompacted);
        }
        match self.meta.get(chromosome) {
            Some(meta) => meta.translate(position),
            None => Ok(position),
        }
    }

    /// Translate a meta genome position back onto the reference.
    pub fn meta_translate_back(&self, chromosome: &str, position: i32) -> Result<i32, Error> {
        if !self.finalized {
            return Err(Error::OffsetsNotCompacted);
        }
        match self.meta.get(chromosome) {
            Some(meta) => meta.translate_back(position),
            None => Ok(position),
        }
    }
}

/// Length change of an ALT allele relative to REF, `None` if it does not shift coordinates.
///
/// Symbolic `<DEL>` and `<INS>` alleles (including subtypes) use `SVLEN` from INFO.
pub fn offset_length(line: &VcfLine, alternative: &str) -> Option<i32> {
    if let Some(symbol) = alternative
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
    {
        let svlen = line
            .info_value("SVLEN")
            .flatten()
            .and_then(|value| value.split(',').next())
            .and_then(|value| value.parse::<i32>().ok())?;
        return match symbol.split(':').next() {
            Some("DEL") => Some(-svlen.saturating_abs()),
            Some("INS") => Some(svlen.saturating_abs()),
            _ => None,
        }
        .filter(|value| *value != 0);
    }
    if alternative.is_empty()
        || alternative == "*"
        || alternative == "."
        || alternative.contains(['[', ']'])
    {
        return None;
    }

    let delta = alternative.len() as i64 - line.reference().len() as i64;
    (delta != 0).then(|| i32::try_from(delta).ok()).flatten()
}

/// Receiver recording the indels of each genome allele.
#[derive(Debug)]
pub struct OffsetCollector {
    genomes: MultiGenome,
}

impl OffsetCollector {
    pub fn new<S>(genome_names: &[S]) -> Self
    where
        S: AsRef<str>,
    {
        Self {
            genomes: MultiGenome::new(genome_names),
        }
    }

    /// Finalize and return the collected genomes.
    pub fn into_genomes(mut self) -> MultiGenome {
        self.genomes.finalize();
        self.genomes
    }
}

impl LineReceiver for OffsetCollector {
    fn process_line(&mut self, scanned: &ScannedLine<'_>) -> Result<(), Error> {
        let line = scanned.current_line();
        for sample_idx in 0..line.sample_count() {
            let Some(genome) = scanned.genome_name(sample_idx) else {
                continue;
            };
            let Some(genotype) = line.genotype(sample_idx) else {
                continue;
            };
            for (slot, allele) in genotype.alleles.iter().enumerate().take(2) {
                let (Some(allele_type), Some(allele_idx)) = (AlleleType::from_slot(slot), *allele)
                else {
                    continue;
                };
                if allele_idx == 0 {
                    continue;
                }
                let Some(length) = line
                    .alternative(allele_idx)
                    .and_then(|alt| offset_length(line, alt))
                else {
                    continue;
                };
                self.genomes.add_offset(
                    genome,
                    allele_type,
                    line.chromosome(),
                    MgOffset::new(line.position(), length),
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::{testing, CancellationToken};
    use crate::scan::{MultiFileScanner, ScanConfig, Scanner};

    fn line(text: &str) -> VcfLine {
        VcfLine::parse(&text.replace(' ', "\t"), 1).unwrap()
    }

    #[rstest::rstest]
    #[case("1 10 . A G . . . GT 0|1", "G", None)]
    #[case("1 10 . A AGT . . . GT 0|1", "AGT", Some(2))]
    #[case("1 10 . ACGT A . . . GT 0|1", "A", Some(-3))]
    #[case("1 10 . N <DEL> . . SVLEN=-200 GT 0|1", "<DEL>", Some(-200))]
    #[case("1 10 . N <DEL:ME> . . SVLEN=200 GT 0|1", "<DEL:ME>", Some(-200))]
    #[case("1 10 . N <INS> . . SVLEN=50 GT 0|1", "<INS>", Some(50))]
    #[case("1 10 . N <DEL> . . SVLEN=-2147483648 GT 0|1", "<DEL>", Some(-2147483647))]
    #[case("1 10 . N <INV> . . SVLEN=50 GT 0|1", "<INV>", None)]
    #[case("1 10 . N <DEL> . . . GT 0|1", "<DEL>", None)]
    #[case("1 10 . A * . . . GT 0|1", "*", None)]
    #[case("1 10 . A A[2:20[ . . . GT 0|1", "A[2:20[", None)]
    fn offset_lengths(#[case] text: &str, #[case] alt: &str, #[case] expected: Option<i32>) {
        assert_eq!(offset_length(&line(text), alt), expected);
    }

    #[test]
    fn multi_genome_translation() -> Result<(), anyhow::Error> {
        let mut genomes = MultiGenome::new(&["alpha", "beta"]);
        let paternal = AlleleType::Paternal;
        let maternal = AlleleType::Maternal;
        genomes.add_offset("alpha", paternal, "1", MgOffset::new(100, 2))?;
        genomes.add_offset("alpha", paternal, "1", MgOffset::new(100, -1))?;
        genomes.add_offset("alpha", paternal, "1", MgOffset::new(250, 5))?;
        genomes.add_offset("alpha", paternal, "2", MgOffset::new(10, 7))?;
        genomes.add_offset("beta", maternal, "1", MgOffset::new(100, 4))?;
        genomes.add_offset("beta", maternal, "1", MgOffset::new(200, -10))?;
        assert!(genomes
            .add_offset("gamma", paternal, "1", MgOffset::new(1, 1))
            .is_err());

        assert!(matches!(
            genomes.translate("alpha", paternal, "1", 300),
            Err(Error::OffsetsNotCompacted)
        ));
        genomes.finalize();
        assert!(genomes.is_finalized());

        assert_eq!(genomes.translate("alpha", paternal, "1", 300)?, 306);
        assert_eq!(genomes.translate("alpha", paternal, "1", 150)?, 151);
        assert_eq!(genomes.translate("alpha", paternal, "1", 50)?, 50);
        assert_eq!(genomes.translate("alpha", paternal, "2", 50)?, 57);
        assert_eq!(genomes.translate("alpha", paternal, "3", 50)?, 50);
        assert_eq!(genomes.translate("alpha", maternal, "1", 300)?, 300);
        assert_eq!(genomes.translate("beta", maternal, "1", 150)?, 154);
        assert!(matches!(
            genomes.translate("gamma", paternal, "1", 1),
            Err(Error::UnknownGenome(_))
        ));

        // alpha/paternal 151 is reference 150, which is 154 on beta/maternal.
        assert_eq!(
            genomes.translate_between("1", ("alpha", paternal), 151, ("beta", maternal))?,
            154
        );

        // Meta genome: largest insertion at each position.
        assert_eq!(
            genomes.meta("1").map(|meta| meta.offsets().to_vec()),
            Some(vec![MgOffset::new(100, 4), MgOffset::new(250, 5)])
        );
        assert_eq!(genomes.meta_translate("1", 300)?, 309);
        assert_eq!(genomes.meta_translate_back("1", 309)?, 300);
        assert_eq!(genomes.meta_translate("2", 300)?, 307);
        assert_eq!(genomes.meta_translate("X", 300)?, 300);

        Ok(())
    }

    #[test]
    fn collect_offsets_from_files() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("sample.vcf.gz");
        testing::write_bgzf_vcf(&path, testing::HEADER, &testing::two_chromosome_lines(), 2)?;

        let mut scanner = MultiFileScanner::new(&[&path], ScanConfig::default())?;
        let mut collector = OffsetCollector::new(scanner.genome_list());
        scanner.scan(&mut collector, &CancellationToken::new())?;
        let genomes = collector.into_genomes();

        let offsets = |genome: &str, chrom: &str, allele: AlleleType| -> Vec<MgOffset> {
            genomes
                .genome(genome)
                .ok()
                .and_then(|genome| genome.allele(chrom, allele))
                .map(|allele| allele.offsets().to_vec())
                .unwrap_or_default()
        };
        // 1:200 AC>A, 1:300 G>GTTT, 2:80 CAA>C,CA
        assert_eq!(
            offsets("alpha", "1", AlleleType::Paternal),
            vec![MgOffset::new(200, -1)]
        );
        assert_eq!(
            offsets("alpha", "1", AlleleType::Maternal),
            vec![MgOffset::new(300, 3)]
        );
        assert_eq!(
            offsets("alpha", "2", AlleleType::Paternal),
            vec![MgOffset::new(80, -2)]
        );
        assert_eq!(
            offsets("alpha", "2", AlleleType::Maternal),
            vec![MgOffset::new(80, -1)]
        );
        assert_eq!(
            offsets("beta", "1", AlleleType::Paternal),
            vec![MgOffset::new(300, 3)]
        );
        assert!(offsets("beta", "1", AlleleType::Maternal).is_empty());
        assert!(offsets("beta", "2", AlleleType::Maternal).is_empty());

        assert_eq!(genomes.translate("alpha", AlleleType::Maternal, "1", 400)?, 403);
        assert_eq!(genomes.meta_translate("1", 400)?, 403);

        Ok(())
    }
}
