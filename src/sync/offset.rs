//! Indel offsets on the reference genome.

use std::cmp::Ordering;

/// A length change at a reference position: positive for insertions, negative for deletions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct MgOffset {
    /// 1-based reference position.
    pub position: i32,
    /// Signed length delta.
    pub value: i32,
}

impl MgOffset {
    pub fn new(position: i32, value: i32) -> Self {
        Self { position, value }
    }
}

impl Ord for MgOffset {
    fn cmp(&self, other: &Self) -> Ordering {
        self.position
            .cmp(&other.position)
            .then_with(|| self.value.cmp(&other.value))
    }
}

impl PartialOrd for MgOffset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
