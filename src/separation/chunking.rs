//! Segmenting long recordings for fixed-window separation models
//!
//! HTDemucs v4 accepts ~7.8 s per pass. Segments overlap by one second and are
//! blended back with linear crossfades, normalized by the summed weights.

/// HTDemucs v4 maximum segment length in seconds
pub const SEGMENT_SECONDS: f32 = 7.8;

/// Overlap between consecutive segments in seconds
pub const OVERLAP_SECONDS: f32 = 1.0;

/// Segment geometry in samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPlan {
    pub segment: usize,
    pub overlap: usize,
}

impl SegmentPlan {
    pub fn htdemucs(sample_rate: u32) -> Self {
        Self {
            segment: (SEGMENT_SECONDS * sample_rate as f32) as usize,
            overlap: (OVERLAP_SECONDS * sample_rate as f32) as usize,
        }
    }

    pub fn stride(&self) -> usize {
        self.segment.saturating_sub(self.overlap).max(1)
    }

    /// `(start, end)` sample ranges covering `total` samples
    pub fn segments(&self, total: usize) -> Vec<(usize, usize)> {
        if total <= self.segment {
            return vec![(0, total)];
        }

        let mut out = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.segment).min(total);
            out.push((start, end));
            if end == total {
                break;
            }
            start += self.stride();
        }
        out
    }
}

/// Linear fade-in/fade-out weights for one segment
pub fn crossfade_weights(len: usize, overlap: usize, fade_in: bool, fade_out: bool) -> Vec<f32> {
    let mut weights = vec![1.0f32; len];
    let fade = overlap.min(len);
    if fade == 0 {
        return weights;
    }

    if fade_in {
        for (i, w) in weights.iter_mut().take(fade).enumerate() {
            *w = (i + 1) as f32 / (fade + 1) as f32;
        }
    }
    if fade_out {
        let start = len - fade;
        for (i, w) in weights[start..].iter_mut().enumerate() {
            *w *= (fade - i) as f32 / (fade + 1) as f32;
        }
    }
    weights
}

/// Weighted overlap-add accumulator for one output channel
#[derive(Debug, Clone)]
pub struct OverlapAdd {
    sum: Vec<f32>,
    weight: Vec<f32>,
}

impl OverlapAdd {
    pub fn new(total: usize) -> Self {
        Self {
            sum: vec![0.0; total],
            weight: vec![0.0; total],
        }
    }

    pub fn add(&mut self, start: usize, samples: &[f32], weights: &[f32]) {
        for (i, (s, w)) in samples.iter().zip(weights).enumerate() {
            let idx = start + i;
            if idx >= self.sum.len() {
                break;
            }
            self.sum[idx] += s * w;
            self.weight[idx] += w;
        }
    }

    pub fn finish(self) -> Vec<f32> {
        self.sum
            .into_iter()
            .zip(self.weight)
            .map(|(s, w)| if w > 1e-8 { s / w } else { 0.0 })
            .collect()
    }
}
