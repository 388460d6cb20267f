//! The VCF model used by the scanners and filters: columns, parsed lines, headers.

pub mod header;
pub mod line;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use header::VcfHeader;
pub use line::{Genotype, VcfLine};

/// The fixed columns of a VCF data line.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    parse_display::Display,
    parse_display::FromStr,
    serde::Deserialize,
    serde::Serialize,
)]
#[display(style = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum VcfColumn {
    Chrom,
    Pos,
    Id,
    Ref,
    Alt,
    Qual,
    Filter,
    Info,
    Format,
}

impl VcfColumn {
    /// Whether values of this column are addressed by a key (INFO and FORMAT).
    pub fn is_keyed(&self) -> bool {
        matches!(self, VcfColumn::Info | VcfColumn::Format)
    }
}

/// One of the VCF files taking part in a scan.
///
/// This is what receivers see as "the current VCF file"; readers themselves stay with the
/// scanner.
#[derive(Debug, Clone)]
pub struct VcfFile {
    /// Index of the file within the scan.
    pub index: usize,
    /// Path to the file.
    pub path: PathBuf,
    /// The header as read from the file.
    pub header: Arc<VcfHeader>,
}

impl VcfFile {
    pub fn new(index: usize, path: &Path, header: Arc<VcfHeader>) -> Self {
        Self {
            index,
            path: path.to_path_buf(),
            header,
        }
    }
}
