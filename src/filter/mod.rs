//! Variant filters: ID filters, their compiled per-chromosome form and a cache for the latter.

pub mod cache;
pub mod compiled;
pub mod inequality;
pub mod kind;
pub mod set;

pub use cache::FilterCache;
pub use compiled::VcfFilter;
pub use inequality::{Inequality, InequalityOp};
pub use kind::{FilterKind, GenomeOperator, HeaderId, IdFilter};
pub use set::FilterSet;
