//! Parsed VCF data lines.

use std::ops::Range;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use super::VcfColumn;
use crate::error::Error;

/// Number of mandatory columns (CHROM to INFO).
const MANDATORY_COLUMNS: usize = 8;

/// One data line of a VCF file.
///
/// Lines are immutable once parsed and shared as `Arc<VcfLine>`, so receivers may keep them
/// beyond the scan step that produced them.  The raw text is kept for writing the line back.
#[derive(Debug)]
pub struct VcfLine {
    /// The line as read, without the line terminator.
    raw: String,
    /// Reference genome chromosome.
    chromosome: String,
    /// 1-based position of the first reference base.
    position: i32,
    /// The ID column.
    id: String,
    /// Reference bases.
    reference: String,
    /// Alternative alleles, empty for `.`.
    alternatives: Vec<String>,
    /// Quality, `None` for `.`.
    quality: Option<f64>,
    /// The FILTER column.
    filter: String,
    /// The INFO column as written.
    info_text: String,
    /// The FORMAT keys.
    format: Vec<String>,
    /// One genotype cell per sample.
    samples: Vec<String>,
    /// Lazily parsed INFO column.
    info: OnceCell<IndexMap<String, Option<String>>>,
}

impl PartialEq for VcfLine {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl VcfLine {
    /// Parse one tab-separated data line.
    ///
    /// `line_number` is only used for error reporting.
    pub fn parse(text: &str, line_number: usize) -> Result<Self, Error> {
        let raw = text.trim_end_matches(['\n', '\r']).to_string();
        let fields: Vec<&str> = raw.split('\t').collect();
        if fields.len() < MANDATORY_COLUMNS {
            return Err(Error::malformed(
                line_number,
                format!(
                    "expected at least {} columns, found {}",
                    MANDATORY_COLUMNS,
                    fields.len()
                ),
            ));
        }

        let chromosome = fields[0].to_string();
        if chromosome.is_empty() {
            return Err(Error::malformed(line_number, "empty CHROM"));
        }
        let position: i32 = fields[1].parse().map_err(|_| {
            Error::malformed(line_number, format!("invalid POS {:?}", fields[1]))
        })?;
        if position < 0 {
            return Err(Error::malformed(line_number, "negative POS"));
        }
        let reference = fields[3].to_string();
        if reference.is_empty() {
            return Err(Error::malformed(line_number, "empty REF"));
        }
        if i32::try_from(reference.len())
            .ok()
            .and_then(|len| position.checked_add(len))
            .is_none()
        {
            return Err(Error::malformed(
                line_number,
                format!("REF at POS {} ends beyond {}", position, i32::MAX),
            ));
        }
        let alternatives = match fields[4] {
            "." | "" => Vec::new(),
            alts => alts.split(',').map(str::to_string).collect(),
        };
        let quality = match fields[5] {
            "." | "" => None,
            qual => Some(qual.parse::<f64>().map_err(|_| {
                Error::malformed(line_number, format!("invalid QUAL {:?}", qual))
            })?),
        };
        let format = match fields.get(MANDATORY_COLUMNS) {
            Some(format) if !format.is_empty() && *format != "." => {
                format.split(':').map(str::to_string).collect()
            }
            _ => Vec::new(),
        };
        let samples = fields
            .iter()
            .skip(MANDATORY_COLUMNS + 1)
            .map(|s| s.to_string())
            .collect();

        Ok(Self {
            chromosome,
            position,
            id: fields[2].to_string(),
            reference,
            alternatives,
            quality,
            filter: fields[6].to_string(),
            info_text: fields[7].to_string(),
            format,
            samples,
            info: OnceCell::new(),
            raw,
        })
    }

    /// The line as read.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    /// 1-based position.
    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    /// The alternative allele for a 1-based allele index from a genotype.
    pub fn alternative(&self, allele_index: usize) -> Option<&str> {
        allele_index
            .checked_sub(1)
            .and_then(|idx| self.alternatives.get(idx))
            .map(String::as_str)
    }

    pub fn quality(&self) -> Option<f64> {
        self.quality
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn info_text(&self) -> &str {
        &self.info_text
    }

    pub fn format_keys(&self) -> &[String] {
        &self.format
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// INFO entries in line order; flags map to `None`.
    pub fn info(&self) -> &IndexMap<String, Option<String>> {
        self.info.get_or_init(|| {
            self.info_text
                .split(';')
                .filter(|entry| !entry.is_empty() && *entry != ".")
                .map(|entry| match entry.split_once('=') {
                    Some((key, value)) => (key.to_string(), Some(value.to_string())),
                    None => (entry.to_string(), None),
                })
                .collect()
        })
    }

    /// Value of an INFO key; `Some(None)` for a flag.
    pub fn info_value(&self, key: &str) -> Option<Option<&str>> {
        self.info().get(key).map(|value| value.as_deref())
    }

    /// Value of a FORMAT key for the sample at `sample_idx`.
    ///
    /// Trailing fields may be dropped in VCF, those are `None` as well as `.` values.
    pub fn sample_value(&self, sample_idx: usize, key: &str) -> Option<&str> {
        let key_idx = self.format.iter().position(|k| k == key)?;
        let value = self.samples.get(sample_idx)?.split(':').nth(key_idx)?;
        if value.is_empty() || value == "." {
            None
        } else {
            Some(value)
        }
    }

    /// The parsed GT value of the sample at `sample_idx`.
    pub fn genotype(&self, sample_idx: usize) -> Option<Genotype> {
        self.sample_value(sample_idx, "GT").map(Genotype::parse)
    }

    /// End position (exclusive, 1-based).
    ///
    /// This is `position + len(REF)` unless INFO has an `END` key.  `END` is the inclusive end
    /// so the exclusive end is one past it.  An `END` without a representable exclusive end is
    /// ignored.
    pub fn end(&self) -> i32 {
        let default_end = i32::try_from(self.reference.len())
            .ok()
            .and_then(|len| self.position.checked_add(len))
            .unwrap_or(i32::MAX);
        match self.info_value("END").flatten().map(str::parse::<i32>) {
            Some(Ok(end)) if end >= self.position && end < i32::MAX => end + 1,
            Some(_) => {
                tracing::trace!(
                    "ignoring unusable END on {}:{}",
                    self.chromosome,
                    self.position
                );
                default_end
            }
            None => default_end,
        }
    }

    /// The half-open interval `[position, end)` covered by the line.
    pub fn interval(&self) -> Range<i32> {
        self.position..self.end()
    }

    /// The text of a whole column.
    pub fn column_text(&self, column: VcfColumn) -> String {
        match column {
            VcfColumn::Chrom => self.chromosome.clone(),
            VcfColumn::Pos => self.position.to_string(),
            VcfColumn::Id => self.id.clone(),
            VcfColumn::Ref => self.reference.clone(),
            VcfColumn::Alt => {
                if self.alternatives.is_empty() {
                    ".".to_string()
                } else {
                    self.alternatives.join(",")
                }
            }
            VcfColumn::Qual => self
                .raw
                .split('\t')
                .nth(5)
                .unwrap_or(".")
                .to_string(),
            VcfColumn::Filter => self.filter.clone(),
            VcfColumn::Info => self.info_text.clone(),
            VcfColumn::Format => self.format.join(":"),
        }
    }

    /// Tokens of a column as used for presence checks.
    pub fn column_tokens(&self, column: VcfColumn) -> Vec<&str> {
        match column {
            VcfColumn::Chrom => vec![self.chromosome.as_str()],
            VcfColumn::Pos | VcfColumn::Qual => Vec::new(),
            VcfColumn::Id => split_tokens(&self.id, ';'),
            VcfColumn::Ref => vec![self.reference.as_str()],
            VcfColumn::Alt => self
                .alternatives
                .iter()
                .map(|alt| {
                    alt.strip_prefix('<')
                        .and_then(|symbol| symbol.strip_suffix('>'))
                        .unwrap_or(alt)
                })
                .collect(),
            VcfColumn::Filter => split_tokens(&self.filter, ';'),
            VcfColumn::Info => self.info().keys().map(String::as_str).collect(),
            VcfColumn::Format => self.format.iter().map(String::as_str).collect(),
        }
    }
}

/// Split a column into tokens, `.` being the empty column.
fn split_tokens(text: &str, sep: char) -> Vec<&str> {
    if text.is_empty() || text == "." {
        Vec::new()
    } else {
        text.split(sep).collect()
    }
}

/// A parsed GT value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Genotype {
    /// Allele indices, `None` for no-call (`.`).
    pub alleles: Vec<Option<usize>>,
    /// Whether the genotype is phased (`|`).
    pub phased: bool,
}

impl Genotype {
    /// Parse a GT value such as `0|1`, `1/1`, `./.` or haploid `1`.
    ///
    /// Unparseable allele tokens are treated as no-calls.
    pub fn parse(text: &str) -> Self {
        let phased = text.contains('|');
        let alleles = text
            .split(['|', '/'])
            .map(|token| token.parse::<usize>().ok())
            .collect();
        Self { alleles, phased }
    }

    /// The allele index at the given haplotype slot (0 = paternal, 1 = maternal).
    pub fn allele(&self, slot: usize) -> Option<usize> {
        self.alleles.get(slot).copied().flatten()
    }

    /// Whether at least one called allele differs from the reference.
    pub fn has_alternative(&self) -> bool {
        self.alleles.iter().any(|a| matches!(a, Some(i) if *i > 0))
    }

    /// Whether no allele was called.
    pub fn is_no_call(&self) -> bool {
        self.alleles.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    const LINE: &str = "1\t100\trs1;rs2\tACG\tA,ACGTT\t45.5\tPASS;lowq\tDP=12;DB;AF=0.5,0.25\tGT:DP\t0|1:7\t2/2\t.:3";

    #[test]
    fn parse_full_line() -> Result<(), anyhow::Error> {
        let line = VcfLine::parse(LINE, 1)?;

        assert_eq!(line.chromosome(), "1");
        assert_eq!(line.position(), 100);
        assert_eq!(line.id(), "rs1;rs2");
        assert_eq!(line.reference(), "ACG");
        assert_eq!(line.alternatives(), &["A".to_string(), "ACGTT".to_string()]);
        assert_eq!(line.alternative(2), Some("ACGTT"));
        assert_eq!(line.alternative(0), None);
        assert_eq!(line.quality(), Some(45.5));
        assert_eq!(line.filter(), "PASS;lowq");
        assert_eq!(line.format_keys(), &["GT".to_string(), "DP".to_string()]);
        assert_eq!(line.sample_count(), 3);
        assert_eq!(line.raw(), LINE);

        Ok(())
    }

    #[test]
    fn info_is_parsed_lazily() -> Result<(), anyhow::Error> {
        let line = VcfLine::parse(LINE, 1)?;

        assert_eq!(line.info_value("DP"), Some(Some("12")));
        assert_eq!(line.info_value("DB"), Some(None));
        assert_eq!(line.info_value("AF"), Some(Some("0.5,0.25")));
        assert_eq!(line.info_value("XX"), None);
        assert_eq!(line.column_tokens(VcfColumn::Info), vec!["DP", "DB", "AF"]);

        Ok(())
    }

    #[test]
    fn sample_values_and_genotypes() -> Result<(), anyhow::Error> {
        let line = VcfLine::parse(LINE, 1)?;

        assert_eq!(line.sample_value(0, "DP"), Some("7"));
        assert_eq!(line.sample_value(1, "DP"), None);
        assert_eq!(line.sample_value(2, "DP"), Some("3"));
        assert_eq!(line.sample_value(5, "GT"), None);

        let gt = line.genotype(0).expect("has GT");
        assert!(gt.phased);
        assert_eq!(gt.allele(0), Some(0));
        assert_eq!(gt.allele(1), Some(1));
        assert!(gt.has_alternative());

        assert_eq!(line.genotype(1).map(|gt| gt.alleles), Some(vec![Some(2), Some(2)]));
        assert_eq!(line.genotype(2), None);

        Ok(())
    }

    #[rstest::rstest]
    #[case("./.", true, false)]
    #[case("0/0", false, false)]
    #[case("0|2", false, true)]
    #[case("1", false, true)]
    fn genotype_parse(#[case] text: &str, #[case] no_call: bool, #[case] has_alt: bool) {
        let gt = Genotype::parse(text);
        assert_eq!(gt.is_no_call(), no_call);
        assert_eq!(gt.has_alternative(), has_alt);
    }

    #[rstest::rstest]
    #[case("1\t100\t.\tACG\tA\t.\t.\t.", 100..103)]
    #[case("1\t100\t.\tA\t<DEL>\t.\t.\tSVTYPE=DEL;END=150", 100..151)]
    #[case("1\t100\t.\tA\t<DEL>\t.\t.\tEND=abc", 100..101)]
    #[case("1\t100\t.\tAC\t<DEL>\t.\t.\tEND=50", 100..102)]
    #[case("1\t100\t.\tA\tT\t.\t.\tXEND=500", 100..101)]
    #[case("1\t2147483646\t.\tA\t<DEL>\t.\t.\tEND=2147483647", 2147483646..2147483647)]
    fn interval(
        #[case] text: &str,
        #[case] expected: std::ops::Range<i32>,
    ) -> Result<(), anyhow::Error> {
        let line = VcfLine::parse(text, 1)?;
        assert_eq!(line.interval(), expected);

        Ok(())
    }

    #[rstest::rstest]
    #[case("1\t100\t.\tA", "expected at least 8 columns, found 4")]
    #[case("1\tabc\t.\tA\tT\t.\t.\t.", "invalid POS \"abc\"")]
    #[case("1\t100\t.\t\tT\t.\t.\t.", "empty REF")]
    #[case("1\t100\t.\tA\tT\tq\t.\t.", "invalid QUAL \"q\"")]
    #[case(
        "1\t2147483647\t.\tAC\tA\t.\t.\t.",
        "REF at POS 2147483647 ends beyond 2147483647"
    )]
    #[case("1\t2147483648\t.\tA\tT\t.\t.\t.", "invalid POS \"2147483648\"")]
    fn parse_malformed(#[case] text: &str, #[case] message: &str) {
        match VcfLine::parse(text, 7) {
            Err(Error::MalformedLine {
                line_number,
                message: actual,
            }) => {
                assert_eq!(line_number, 7);
                assert_eq!(actual, message);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn column_text_and_tokens() -> Result<(), anyhow::Error> {
        let line = VcfLine::parse(LINE, 1)?;

        assert_eq!(line.column_text(VcfColumn::Alt), "A,ACGTT");
        assert_eq!(line.column_text(VcfColumn::Qual), "45.5");
        assert_eq!(line.column_text(VcfColumn::Format), "GT:DP");
        assert_eq!(line.column_tokens(VcfColumn::Filter), vec!["PASS", "lowq"]);
        assert_eq!(line.column_tokens(VcfColumn::Id), vec!["rs1", "rs2"]);
        assert_eq!(line.column_tokens(VcfColumn::Alt), vec!["A", "ACGTT"]);

        let symbolic = VcfLine::parse("1\t5\t.\tN\t<DEL>,<INS:ME>,A\t.\t.\t.", 1)?;
        assert_eq!(
            symbolic.column_tokens(VcfColumn::Alt),
            vec!["DEL", "INS:ME", "A"]
        );
        assert_eq!(symbolic.column_text(VcfColumn::Alt), "<DEL>,<INS:ME>,A");

        let empty = VcfLine::parse("1\t5\t.\tA\t.\t.\t.\t.", 1)?;
        assert!(empty.column_tokens(VcfColumn::Id).is_empty());
        assert!(empty.column_tokens(VcfColumn::Info).is_empty());
        assert!(empty.alternatives().is_empty());

        Ok(())
    }
}
