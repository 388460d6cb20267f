//! VCF header access.

use std::path::Path;

use noodles::vcf;

use super::VcfColumn;
use crate::error::Error;

/// An ID declared in the header, e.g., `##INFO=<ID=DP,...>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderIdInfo {
    /// The column the ID applies to.
    pub column: VcfColumn,
    /// The declared ID.
    pub id: String,
    /// The declared description.
    pub description: String,
}

/// The header of a VCF file.
///
/// Parsing is done by `noodles`; the raw text is kept so that it can be written out again
/// unchanged.
#[derive(Debug, Clone)]
pub struct VcfHeader {
    /// The parsed header.
    inner: vcf::Header,
    /// The header lines as read, including the `#CHROM` line, each terminated by `\n`.
    text: String,
    /// The sample names; in a multi-genome project these are the genome names.
    sample_names: Vec<String>,
}

impl VcfHeader {
    /// Parse the header text (all `#` lines) read from `path`.
    pub fn parse(text: &str, path: &Path) -> Result<Self, Error> {
        let inner: vcf::Header = text.parse().map_err(|e| Error::Header {
            path: path.to_path_buf(),
            message: format!("{}", e),
        })?;
        let sample_names = inner.sample_names().iter().cloned().collect();
        Ok(Self {
            inner,
            text: text.to_string(),
            sample_names,
        })
    }

    /// The parsed `noodles` header.
    pub fn inner(&self) -> &vcf::Header {
        &self.inner
    }

    /// The header text as read.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    /// Column index of a sample by name.
    pub fn sample_index(&self, name: &str) -> Option<usize> {
        self.sample_names.iter().position(|n| n == name)
    }

    /// Contig names from `##contig` lines, in header order.
    pub fn contig_names(&self) -> Vec<String> {
        self.inner.contigs().keys().cloned().collect()
    }

    /// IDs declared for the given column.
    ///
    /// Only INFO, FORMAT, FILTER and ALT have header declarations.
    pub fn ids(&self, column: VcfColumn) -> Vec<HeaderIdInfo> {
        let entry = |id: &str, description: &str| HeaderIdInfo {
            column,
            id: id.to_string(),
            description: description.to_string(),
        };
        match column {
            VcfColumn::Info => self
                .inner
                .infos()
                .iter()
                .map(|(id, map)| entry(id, map.description()))
                .collect(),
            VcfColumn::Format => self
                .inner
                .formats()
                .iter()
                .map(|(id, map)| entry(id, map.description()))
                .collect(),
            VcfColumn::Filter => self
                .inner
                .filters()
                .iter()
                .map(|(id, map)| entry(id, map.description()))
                .collect(),
            VcfColumn::Alt => self
                .inner
                .alternative_alleles()
                .iter()
                .map(|(id, map)| entry(id, map.description()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether the header declares `id` for `column`.
    pub fn has_id(&self, column: VcfColumn, id: &str) -> bool {
        self.ids(column).iter().any(|info| info.id == id)
    }
}
