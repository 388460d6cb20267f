//! Multi-genome VCF synchronization and variant filtering.
//!
//! The crate reads bgzipped and Tabix-indexed VCF files (`tabix`), scans one or several of them
//! in step (`scan`), derives the indel offsets of each genome allele to translate coordinates
//! between genomes (`sync`) and evaluates variant filters on the lines (`filter`).

pub mod cli;
pub mod common;
pub mod error;
pub mod export;
pub mod filter;
pub mod scan;
pub mod sync;
pub mod tabix;
pub mod variant;
pub mod vcf;

/// Information about the build.
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
