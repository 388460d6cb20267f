//! Filters on a single header ID or column.

use std::collections::BTreeSet;

use super::inequality::Inequality;
use crate::variant::Variant;
use crate::vcf::{VcfColumn, VcfHeader, VcfLine};

/// The column and ID a filter applies to.
///
/// For INFO and FORMAT, `id` is the key.  For the other columns it names the column, or a
/// FILTER/ALT ID for flag filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct HeaderId {
    pub column: VcfColumn,
    pub id: String,
}

impl HeaderId {
    pub fn new(column: VcfColumn, id: &str) -> Self {
        Self {
            column,
            id: id.to_string(),
        }
    }

    /// Label used in descriptions, e.g., `INFO DP` or `QUAL`.
    fn label(&self) -> String {
        if self.id.is_empty() || self.id == self.column.to_string() {
            self.column.to_string()
        } else {
            format!("{} {}", self.column, self.id)
        }
    }
}

/// How the predicates over the named genomes combine.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GenomeOperator {
    /// At least one genome.
    #[default]
    Any,
    /// Every genome.
    All,
}

/// The predicate of a filter.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterKind {
    /// The ID is present (`required = true`) or absent (`required = false`).
    Flag {
        #[serde(default)]
        required: Option<bool>,
    },
    /// The value equals (`required = true`) or differs from (`required = false`) `value`.
    Text {
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        required: Option<bool>,
    },
    /// The numeric value satisfies `first`, and/or `second` if given.
    Numeric {
        #[serde(default)]
        first: Option<Inequality>,
        #[serde(default)]
        second: Option<Inequality>,
        /// Both inequations must hold, otherwise one suffices.
        #[serde(default)]
        cumulative: bool,
    },
}

/// A filter on one header ID, scoped to a set of genomes.
///
/// The genome names form a set, kept sorted so that equal filters serialize equally.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IdFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub header_id: Option<HeaderId>,
    pub kind: FilterKind,
    #[serde(default)]
    pub genome_names: BTreeSet<String>,
    #[serde(default)]
    pub operator: GenomeOperator,
}

impl IdFilter {
    pub fn new(header_id: HeaderId, kind: FilterKind) -> Self {
        Self {
            name: None,
            header_id: Some(header_id),
            kind,
            genome_names: BTreeSet::new(),
            operator: GenomeOperator::Any,
        }
    }

    /// Restrict the filter to the given genomes.
    pub fn with_genomes<S>(mut self, names: &[S], operator: GenomeOperator) -> Self
    where
        S: AsRef<str>,
    {
        self.genome_names = names.iter().map(|s| s.as_ref().to_string()).collect();
        self.operator = operator;
        self
    }

    /// Configuration problems, joined by `"; "`, or `None` if the filter is complete.
    pub fn errors(&self) -> Option<String> {
        let mut errors = Vec::new();
        match &self.header_id {
            None => errors.push("missing header ID".to_string()),
            Some(header_id) if header_id.column.is_keyed() && header_id.id.is_empty() => {
                errors.push(format!("missing {} key", header_id.column))
            }
            Some(_) => (),
        }
        match &self.kind {
            FilterKind::Flag { required } => {
                if required.is_none() {
                    errors.push("missing required flag".to_string());
                }
            }
            FilterKind::Text { value, required } => {
                if value.is_none() {
                    errors.push("missing value".to_string());
                }
                if required.is_none() {
                    errors.push("missing required flag".to_string());
                }
            }
            FilterKind::Numeric { first, .. } => {
                if first.is_none() {
                    errors.push("missing first inequation".to_string());
                }
            }
        }

        if errors.is_empty() {
            None
        } else {
            Some(errors.join("; "))
        }
    }

    /// A structurally equal copy.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// One-line summary, e.g., `QUAL >= 30 AND < 100`.
    pub fn description(&self) -> String {
        let label = self
            .header_id
            .as_ref()
            .map(HeaderId::label)
            .unwrap_or_else(|| "?".to_string());
        let predicate = match &self.kind {
            FilterKind::Flag { required } => match required {
                Some(true) => format!("{} present", label),
                Some(false) => format!("{} absent", label),
                None => format!("{} ?", label),
            },
            FilterKind::Text { value, required } => {
                let op = match required {
                    Some(false) => "!=",
                    _ => "=",
                };
                format!("{} {} {}", label, op, value.as_deref().unwrap_or("?"))
            }
            FilterKind::Numeric {
                first,
                second,
                cumulative,
            } => {
                let show = |inequality: &Inequality| {
                    format!("{} {}", inequality.op, inequality.threshold)
                };
                let mut text = format!(
                    "{} {}",
                    label,
                    first.as_ref().map(show).unwrap_or_else(|| "?".to_string())
                );
                if let Some(second) = second {
                    let joiner = if *cumulative { "AND" } else { "OR" };
                    text.push_str(&format!(" {} {}", joiner, show(second)));
                }
                text
            }
        };

        if self.genome_names.is_empty() {
            predicate
        } else {
            let names = self
                .genome_names
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>();
            format!("{} ({} of {})", predicate, self.operator, names.join(", "))
        }
    }

    /// Evaluate the filter on a line; incomplete filters reject every line.
    pub fn is_valid_line(&self, line: &VcfLine, header: &VcfHeader) -> bool {
        if self.errors().is_some() {
            return false;
        }
        let Some(header_id) = &self.header_id else {
            return false;
        };

        // Presence of a FORMAT key is a property of the line, values are per genome.
        let per_genome = !matches!(self.kind, FilterKind::Flag { .. });
        if header_id.column == VcfColumn::Format && per_genome {
            let samples: Vec<Option<usize>> = if self.genome_names.is_empty() {
                (0..line.sample_count()).map(Some).collect()
            } else {
                self.genome_names
                    .iter()
                    .map(|name| header.sample_index(name))
                    .collect()
            };
            let mut results = samples.into_iter().map(|sample_idx| {
                sample_idx.is_some_and(|idx| {
                    self.evaluate(header_id, line.sample_value(idx, &header_id.id), || false)
                })
            });
            return match self.operator {
                GenomeOperator::Any => results.any(|passed| passed),
                GenomeOperator::All => {
                    let results = results.collect::<Vec<_>>();
                    !results.is_empty() && results.into_iter().all(|passed| passed)
                }
            };
        }

        // INFO flags have the empty string as value.
        let column_text =
            (header_id.column != VcfColumn::Info).then(|| line.column_text(header_id.column));
        let value = match &column_text {
            None => line
                .info_value(&header_id.id)
                .map(|value| value.unwrap_or("")),
            Some(text) => Some(text.as_str()).filter(|text| !text.is_empty() && *text != "."),
        };
        let passed = self.evaluate(header_id, value, || {
            line.column_tokens(header_id.column)
                .contains(&header_id.id.as_str())
        });

        passed && self.genomes_carry_variant(line, header)
    }

    /// Problem with the header ID if `header` does not declare it.
    ///
    /// Only INFO, FORMAT, FILTER and ALT IDs are declared in headers; `PASS` is implicit.
    pub fn undeclared_id(&self, header: &VcfHeader) -> Option<String> {
        let header_id = self.header_id.as_ref()?;
        let declared = match header_id.column {
            VcfColumn::Info | VcfColumn::Format => header.has_id(header_id.column, &header_id.id),
            VcfColumn::Filter | VcfColumn::Alt => {
                header_id.id == header_id.column.to_string()
                    || header_id.id == "PASS"
                    || header.has_id(header_id.column, &header_id.id)
            }
            _ => true,
        };
        (!declared).then(|| format!("{} not declared in header", header_id.label()))
    }

    /// Evaluate the filter on the line of a variant.
    pub fn is_valid_variant(&self, variant: &Variant, header: &VcfHeader) -> bool {
        self.is_valid_line(variant.line(), header)
    }

    /// Apply the predicate to a value; `present` tells whether the ID is on the line.
    fn evaluate<F>(&self, header_id: &HeaderId, value: Option<&str>, present: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        match &self.kind {
            FilterKind::Flag { required } => {
                let present = if header_id.column == VcfColumn::Info {
                    value.is_some()
                } else {
                    present()
                };
                Some(present) == *required
            }
            FilterKind::Text { value: expected, required } => {
                let matches = value.is_some() && value == expected.as_deref();
                Some(matches) == *required
            }
            FilterKind::Numeric {
                first,
                second,
                cumulative,
            } => {
                let Some(number) = value
                    .and_then(|value| value.split(',').next())
                    .and_then(|value| value.trim().parse::<f64>().ok())
                else {
                    return false;
                };
                let Some(first) = first else {
                    return false;
                };
                let first = first.is_satisfied(number);
                match second {
                    None => first,
                    Some(second) if *cumulative => first && second.is_satisfied(number),
                    Some(second) => first || second.is_satisfied(number),
                }
            }
        }
    }

    /// Whether the named genomes carry a non-reference allele as required by the operator.
    fn genomes_carry_variant(&self, line: &VcfLine, header: &VcfHeader) -> bool {
        if self.genome_names.is_empty() {
            return true;
        }
        let mut carriers = self.genome_names.iter().map(|name| {
            header
                .sample_index(name)
                .and_then(|idx| line.genotype(idx))
                .is_some_and(|genotype| genotype.has_alternative())
        });
        match self.operator {
            GenomeOperator::Any => carriers.any(|carrier| carrier),
            GenomeOperator::All => carriers.all(|carrier| carrier),
        }
    }
}
