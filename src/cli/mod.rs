//! Implementation of the sub commands.

pub mod filter;
pub mod index;
pub mod query;
pub mod translate;
