//! Raga identification by scale overlap
//!
//! The tonic-relative chroma is normalized by its maximum and thresholded to a
//! set of "captured" scale degrees. Each melakarta scores the size of its
//! intersection with that set; the first entry to reach the best score wins.
//! There is no confidence floor, a weak best match is still returned.

mod table;

pub use table::MELAKARTA;

use crate::types::ChromaVector;
use serde::Serialize;
use std::fmt;

/// Fraction of the peak a pitch class needs to count as part of the scale
pub const CAPTURE_THRESHOLD: f32 = 0.20;

/// One melakarta entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Raga {
    pub number: u8,
    pub name: &'static str,
    /// Semitone offsets from Sa, ascending
    pub scale: [u8; 7],
    pub arohanam: &'static str,
    pub avarohanam: &'static str,
}

impl Raga {
    pub const fn new(
        number: u8,
        name: &'static str,
        scale: [u8; 7],
        arohanam: &'static str,
        avarohanam: &'static str,
    ) -> Self {
        Self {
            number,
            name,
            scale,
            arohanam,
            avarohanam,
        }
    }

    /// Number of `captured` offsets that belong to this raga's scale
    pub fn overlap(&self, captured: &[usize]) -> usize {
        captured
            .iter()
            .filter(|&&offset| self.scale.iter().any(|&d| d as usize == offset))
            .count()
    }
}

impl fmt::Display for Raga {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number, self.name)
    }
}

/// Best-scoring raga for a recording
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RagaMatch {
    pub raga: &'static Raga,
    /// Size of the intersection with the captured set
    pub overlap: usize,
    /// Tonic-relative offsets above the capture threshold
    pub captured: Vec<usize>,
}

/// Offsets (relative to `tonic`) whose energy exceeds [`CAPTURE_THRESHOLD`] of the peak
pub fn captured_scale(chroma: &ChromaVector, tonic: usize) -> Vec<usize> {
    let relative = chroma.rotated(tonic % 12);
    let peak = relative.max();
    if !(peak.is_finite() && peak > 0.0) {
        return Vec::new();
    }

    relative
        .0
        .iter()
        .enumerate()
        .filter(|(_, &v)| v / peak > CAPTURE_THRESHOLD)
        .map(|(i, _)| i)
        .collect()
}

/// Index and score of the best entry in `table`; the earliest entry wins ties
pub fn best_in_table(table: &[Raga], captured: &[usize]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for (i, raga) in table.iter().enumerate() {
        let score = raga.overlap(captured);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((i, score));
        }
    }
    best
}

/// Match the chroma profile against the melakarta table
pub fn identify_raga(chroma: &ChromaVector, tonic: usize) -> RagaMatch {
    let captured = captured_scale(chroma, tonic);
    // The table is non-empty, so a best entry always exists
    let (index, overlap) = best_in_table(&MELAKARTA, &captured).unwrap_or((0, 0));

    RagaMatch {
        raga: &MELAKARTA[index],
        overlap,
        captured,
    }
}
