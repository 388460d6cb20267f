//! Error types of the synchronization and filtering engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the library layer.
///
/// Only `Io`, `Header`, `InvalidIndex` and `MissingIndex` are fatal to a scan.  Malformed lines
/// are collected by the scanners and an unknown chromosome is reported back to the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors when opening or reading compressed data or index files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The VCF header could not be read or parsed.
    #[error("problem with VCF header of {path}: {message}")]
    Header { path: PathBuf, message: String },

    /// The chromosome is absent from the Tabix index.
    #[error("chromosome {0:?} not found in index")]
    InvalidChromosome(String),

    /// Region queries need a Tabix index next to the file.
    #[error("no Tabix index found for {0}")]
    MissingIndex(PathBuf),

    /// The Tabix index could not be decoded.
    #[error("invalid Tabix index: {0}")]
    InvalidIndex(String),

    /// A data line could not be parsed.
    #[error("malformed line {line_number}: {message}")]
    MalformedLine { line_number: usize, message: String },

    /// Offsets were queried before `sort()` and `compact()`.
    #[error("allele offsets queried before being sorted and compacted")]
    OffsetsNotCompacted,

    /// A genome name is not part of the synchronized set.
    #[error("unknown genome {0:?}")]
    UnknownGenome(String),

    /// A filter is not fully configured.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

impl Error {
    /// Create a malformed line error.
    pub fn malformed(line_number: usize, message: impl Into<String>) -> Self {
        Self::MalformedLine {
            line_number,
            message: message.into(),
        }
    }

    /// Create an invalid index error.
    pub fn invalid_index(message: impl Into<String>) -> Self {
        Self::InvalidIndex(message.into())
    }

    /// Whether the error leaves the current scan intact.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::MalformedLine { .. } | Error::InvalidChromosome(_) | Error::InvalidFilter(_)
        )
    }
}
