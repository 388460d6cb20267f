//! Offset lists of single alleles and coordinate translation through them.

use super::offset::MgOffset;
use crate::error::Error;

/// Life cycle of an allele's offset list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Stage {
    #[default]
    Building,
    Sorted,
    Ready,
}

/// The offsets of one allele of one genome.
///
/// Offsets are pushed while scanning; afterwards `sort` and `compact` prepare the lookup
/// tables used by `translate` and `translate_back`.
#[derive(Debug, Clone, Default)]
pub struct MgAllele {
    offsets: Vec<MgOffset>,
    /// Sum of the values of all offsets up to and including each offset.
    cumulative: Vec<i64>,
    /// Translation of the position just before each offset.
    floors: Vec<i64>,
    /// Translation of each offset position.
    starts: Vec<i64>,
    stage: Stage,
}

impl PartialEq for MgAllele {
    fn eq(&self, other: &Self) -> bool {
        self.offsets == other.offsets && self.stage == other.stage
    }
}

impl MgAllele {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ready allele from the given offsets.
    pub fn from_offsets(offsets: Vec<MgOffset>) -> Self {
        let mut result = Self {
            offsets,
            ..Default::default()
        };
        result.sort();
        result.compact();
        result
    }

    /// Record an offset; the allele has to be sorted and compacted again afterwards.
    pub fn push(&mut self, offset: MgOffset) {
        self.offsets.push(offset);
        self.stage = Stage::Building;
    }

    pub fn offsets(&self) -> &[MgOffset] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Whether `translate` may be called.
    pub fn is_ready(&self) -> bool {
        self.stage == Stage::Ready
    }

    /// Order the offsets by position and value.
    pub fn sort(&mut self) {
        if self.stage == Stage::Building {
            self.offsets.sort();
            self.stage = Stage::Sorted;
        }
    }

    /// Merge offsets at the same position by summing their values and prepare the lookup
    /// tables.
    ///
    /// Offsets summing to zero are dropped.  Unsorted offsets are sorted first.  Compacting a
    /// compacted allele changes nothing.
    pub fn compact(&mut self) {
        match self.stage {
            Stage::Ready => return,
            Stage::Building => self.sort(),
            Stage::Sorted => (),
        }

        let mut compacted: Vec<MgOffset> = Vec::with_capacity(self.offsets.len());
        for offset in self.offsets.drain(..) {
            match compacted.last_mut() {
                Some(last) if last.position == offset.position => {
                    last.value = last.value.saturating_add(offset.value)
                }
                _ => compacted.push(offset),
            }
        }
        compacted.retain(|offset| offset.value != 0);
        self.offsets = compacted;

        self.cumulative.clear();
        self.floors.clear();
        self.starts.clear();
        let mut sum = 0i64;
        let mut floor = 0i64;
        for (idx, offset) in self.offsets.iter().enumerate() {
            let before = offset.position as i64 - 1;
            floor = if idx == 0 {
                before
            } else {
                std::cmp::max(floor, before + sum)
            };
            sum += offset.value as i64;
            self.cumulative.push(sum);
            self.floors.push(floor);
            self.starts.push(std::cmp::max(offset.position as i64 + sum, floor));
        }

        self.stage = Stage::Ready;
    }

    /// Translate a reference position into this allele's coordinates.
    ///
    /// The result is the position plus the sum of all offsets at or before it, but never less
    /// than the translation of any smaller position.  Positions inside a deletion thus map onto
    /// the last base before it.
    pub fn translate(&self, position: i32) -> Result<i32, Error> {
        if self.stage != Stage::Ready {
            return Err(Error::OffsetsNotCompacted);
        }
        let idx = self
            .offsets
            .partition_point(|offset| offset.position <= position);
        if idx == 0 {
            return Ok(position);
        }
        let idx = idx - 1;
        let translated = std::cmp::max(position as i64 + self.cumulative[idx], self.floors[idx]);
        Ok(saturate(translated))
    }

    /// Translate a position of this allele back into reference coordinates.
    ///
    /// This is the greatest reference position whose translation is not greater than
    /// `position`.  Inserted bases map to the reference base of the insertion.
    pub fn translate_back(&self, position: i32) -> Result<i32, Error> {
        if self.stage != Stage::Ready {
            return Err(Error::OffsetsNotCompacted);
        }
        let position = position as i64;
        let idx = self.starts.partition_point(|start| *start <= position);
        let result = if idx == 0 {
            match self.offsets.first() {
                Some(first) => std::cmp::min(position, first.position as i64 - 1),
                None => position,
            }
        } else {
            let idx = idx - 1;
            let back = position - self.cumulative[idx];
            match self.offsets.get(idx + 1) {
                Some(next) => std::cmp::min(back, next.position as i64 - 1),
                None => back,
            }
        };
        Ok(saturate(result))
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
