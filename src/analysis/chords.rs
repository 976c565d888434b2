//! Frame-wise triad detection
//!
//! The chromagram is first smoothed with a nearest-neighbour median filter
//! (cosine similarity, self excluded). Each frame then correlates against 24
//! binary triad templates; frames whose strongest class is under the floor are
//! labelled "no chord".

use super::chroma::frames_to_time;
use crate::types::{ChordLabel, ChordQuality, ChromaVector, PitchClass};
use serde::Serialize;

/// Frames with peak energy below this carry no chord
pub const NO_CHORD_FLOOR: f32 = 0.1;

/// Separator used when rendering a progression
pub const PROGRESSION_SEPARATOR: &str = " ➔ ";

/// Per-frame chord labels on a time axis
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChordTimeline {
    pub times: Vec<f64>,
    pub labels: Vec<ChordLabel>,
}

impl ChordTimeline {
    /// Labels with consecutive repeats collapsed
    pub fn progression(&self) -> Vec<ChordLabel> {
        let mut out: Vec<ChordLabel> = Vec::new();
        for label in &self.labels {
            if out.last() != Some(label) {
                out.push(*label);
            }
        }
        out
    }

    pub fn render_progression(&self) -> String {
        self.progression()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(PROGRESSION_SEPARATOR)
    }
}

/// The 24 templates in scan order: for each root C..B, major then minor
pub fn triad_templates() -> Vec<(ChordLabel, [f32; 12])> {
    let mut templates = Vec::with_capacity(24);
    for root in PitchClass::ALL {
        for quality in [ChordQuality::Major, ChordQuality::Minor] {
            let mut mask = [0.0f32; 12];
            for interval in quality.intervals() {
                mask[(root.to_index() + interval) % 12] = 1.0;
            }
            templates.push((ChordLabel::Triad { root, quality }, mask));
        }
    }
    templates
}

/// Best template by dot product; the first template reaching the maximum wins
pub fn classify_frame(frame: &ChromaVector, templates: &[(ChordLabel, [f32; 12])]) -> ChordLabel {
    if frame.max() < NO_CHORD_FLOOR {
        return ChordLabel::NoChord;
    }

    let mut best = ChordLabel::NoChord;
    let mut best_score = f32::NEG_INFINITY;
    for (label, mask) in templates {
        let score: f32 = frame.0.iter().zip(mask).map(|(c, m)| c * m).sum();
        if score > best_score {
            best_score = score;
            best = *label;
        }
    }
    best
}

/// Smooth, then label every frame
pub fn detect_chords(frames: &[ChromaVector], hop: usize, sample_rate: u32) -> ChordTimeline {
    let filtered = nn_median_filter(frames);
    let templates = triad_templates();

    ChordTimeline {
        times: (0..filtered.len()).map(|i| frames_to_time(i, hop, sample_rate)).collect(),
        labels: filtered.iter().map(|f| classify_frame(f, &templates)).collect(),
    }
}

/// Replace each frame by the element-wise median of its most similar frames
///
/// Uses `2 * ceil(sqrt(T - 1))` neighbours by cosine similarity, never the frame
/// itself. Frames without any neighbour are kept unchanged.
pub fn nn_median_filter(frames: &[ChromaVector]) -> Vec<ChromaVector> {
    let t = frames.len();
    if t < 2 {
        return frames.to_vec();
    }
    let k = 2 * ((t - 1) as f64).sqrt().ceil() as usize;

    let norms: Vec<f32> = frames
        .iter()
        .map(|f| f.0.iter().map(|v| v * v).sum::<f32>().sqrt())
        .collect();

    let mut out = Vec::with_capacity(t);
    let mut scored: Vec<(f32, usize)> = Vec::with_capacity(t);
    let mut column: Vec<f32> = Vec::with_capacity(k);

    for i in 0..t {
        if norms[i] == 0.0 {
            out.push(frames[i]);
            continue;
        }

        scored.clear();
        for j in 0..t {
            if j == i || norms[j] == 0.0 {
                continue;
            }
            let dot: f32 = frames[i].0.iter().zip(&frames[j].0).map(|(a, b)| a * b).sum();
            scored.push((dot / (norms[i] * norms[j]), j));
        }
        if scored.is_empty() {
            out.push(frames[i]);
            continue;
        }

        // Most similar first; equal similarity falls back to frame order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        let neighbours = &scored[..k.min(scored.len())];

        let mut smoothed = [0.0f32; 12];
        for (pc, slot) in smoothed.iter_mut().enumerate() {
            column.clear();
            column.extend(neighbours.iter().map(|&(_, j)| frames[j].0[pc]));
            *slot = median(&mut column);
        }
        out.push(ChromaVector(smoothed));
    }

    out
}

/// Median with the mean of the two middle values for even counts
fn median(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
