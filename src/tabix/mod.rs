//! Random access to BGZF-compressed VCF files through Tabix indices.

pub mod index;
pub mod reader;

pub use index::{IndexBuilder, TabixIndex, MAX_POSITION};
pub use reader::{Query, TabixReader};
