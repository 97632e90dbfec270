//! Positional alignment
//!
//! Segment `i` of every reading is compared with segment `i` of every other
//! reading. A reading that runs out of segments abstains at the remaining
//! positions. Cost is engines x longest reading.

use super::segment::Segment;

/// One column of the alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPosition<'a> {
    pub index: usize,
    /// One cell per reading, in reading order; `None` means abstained
    pub cells: Vec<Option<Segment<'a>>>,
}

impl<'a> AlignedPosition<'a> {
    /// Reading indexes without a segment at this position
    pub fn abstained(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(|(i, _)| i)
    }
}

/// Align tokenized readings by position.
pub fn align<'a>(readings: &[Vec<Segment<'a>>]) -> Vec<AlignedPosition<'a>> {
    let len = readings.iter().map(Vec::len).max().unwrap_or(0);
    (0..len)
        .map(|index| AlignedPosition {
            index,
            cells: readings.iter().map(|r| r.get(index).copied()).collect(),
        })
        .collect()
}
