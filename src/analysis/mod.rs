//! Tonal analysis: tonic, raga and chords
//!
//! DSP estimators sit behind the traits in [`traits`]; this module decides how
//! their output is aggregated and interpreted.

pub mod chords;
pub mod chroma;
pub mod pitch;
pub mod raga;
pub mod swara;
pub mod traits;

pub use chords::{detect_chords, ChordTimeline};
pub use chroma::StftChroma;
pub use pitch::ProbabilisticYin;
pub use raga::{identify_raga, Raga, RagaMatch};
pub use swara::{format_swara_sequence, midi_to_western, note_to_swara};
pub use traits::{ChromaExtractor, NoteTranscriber, PitchTracker, SeparationModel};

use crate::audio;
use crate::error::{ErrorContext, RagamError, Result};
use crate::types::{AudioBuffer, ChromaVector, PitchClass};
use std::path::Path;
use tracing::{debug, info};

/// Seconds of audio used for tonic and raga estimation
pub const DEFAULT_ANALYSIS_SECONDS: f64 = 60.0;

/// Seconds of audio used for chord detection
pub const DEFAULT_CHORD_SECONDS: f64 = 30.0;

/// Everything the tonal analyzer reports for one track
#[derive(Debug, Clone)]
pub struct TonalAnalysis {
    pub tonic: PitchClass,
    /// Mean chroma over the analysis window
    pub chroma: ChromaVector,
    pub raga: RagaMatch,
    pub chords: ChordTimeline,
}

/// Tonic of a chromagram: the class with the highest mean energy, first on ties
pub fn estimate_tonic(frames: &[ChromaVector]) -> (PitchClass, ChromaVector) {
    let mean = ChromaVector::mean(frames);
    (PitchClass::from_index(mean.argmax()), mean)
}

/// Tonic estimation, raga matching and chord detection over one track
pub struct TonalAnalyzer {
    extractor: Box<dyn ChromaExtractor>,
    analysis_seconds: f64,
    chord_seconds: f64,
}

impl TonalAnalyzer {
    pub fn new(extractor: Box<dyn ChromaExtractor>) -> Self {
        Self {
            extractor,
            analysis_seconds: DEFAULT_ANALYSIS_SECONDS,
            chord_seconds: DEFAULT_CHORD_SECONDS,
        }
    }

    pub fn with_windows(mut self, analysis_seconds: f64, chord_seconds: f64) -> Self {
        self.analysis_seconds = analysis_seconds;
        self.chord_seconds = chord_seconds;
        self
    }

    /// Decode `path` and analyze it
    pub fn analyze_file(&self, path: &Path) -> Result<TonalAnalysis> {
        let window = self.analysis_seconds.max(self.chord_seconds);
        let buffer = audio::decode_mono(path, Some(window)).with_file_context(path)?;

        if buffer.is_empty() {
            return Err(RagamError::AnalysisFailed {
                path: path.to_path_buf(),
                reason: "track contains no audio samples".to_string(),
            });
        }

        Ok(self.analyze(&buffer))
    }

    /// Analyze an already decoded buffer
    pub fn analyze(&self, buffer: &AudioBuffer) -> TonalAnalysis {
        let frames = self.extractor.chromagram(buffer);
        let hop = self.extractor.hop_length();

        let analysis_frames = frame_count(self.analysis_seconds, hop, buffer.sample_rate).min(frames.len());
        let (tonic, chroma) = estimate_tonic(&frames[..analysis_frames]);
        let raga = identify_raga(&chroma, tonic.to_index());

        let chord_frames = frame_count(self.chord_seconds, hop, buffer.sample_rate).min(frames.len());
        let chords = detect_chords(&frames[..chord_frames], hop, buffer.sample_rate);

        debug!(
            "{}: {} frames, tonic {}, captured {:?}",
            self.extractor.name(),
            frames.len(),
            tonic,
            raga.captured
        );
        info!("Tonic {} / raga {} (overlap {})", tonic, raga.raga, raga.overlap);

        TonalAnalysis {
            tonic,
            chroma,
            raga,
            chords,
        }
    }
}

impl Default for TonalAnalyzer {
    fn default() -> Self {
        Self::new(Box::new(StftChroma::default()))
    }
}

/// Frames whose start lies inside the first `seconds`
fn frame_count(seconds: f64, hop: usize, sample_rate: u32) -> usize {
    if hop == 0 {
        return 0;
    }
    let samples = (seconds.max(0.0) * sample_rate as f64) as usize;
    1 + samples / hop
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns fixed frames regardless of input
    struct FixedChroma(Vec<ChromaVector>);

    impl ChromaExtractor for FixedChroma {
        fn chromagram(&self, _buffer: &AudioBuffer) -> Vec<ChromaVector> {
            self.0.clone()
        }
        fn hop_length(&self) -> usize {
            512
        }
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn frame(pcs: &[usize]) -> ChromaVector {
        let mut v = [0.0f32; 12];
        for &pc in pcs {
            v[pc] = 1.0;
        }
        ChromaVector(v)
    }

    #[test]
    fn test_tonic_is_strongest_mean_class() {
        let frames = vec![frame(&[2, 9]), frame(&[2]), frame(&[9, 6])];
        let (tonic, mean) = estimate_tonic(&frames);
        assert_eq!(tonic, PitchClass::D);
        assert!((mean.0[2] - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_tonic_tie_takes_lowest_class() {
        let (tonic, _) = estimate_tonic(&[frame(&[4, 7])]);
        assert_eq!(tonic, PitchClass::E);
    }

    #[test]
    fn test_analyze_with_fixed_frames() {
        // C weighted highest, the rest of the major scale present
        let mut weighted = frame(&[0, 2, 4, 5, 7, 9, 11]);
        weighted.0[0] = 1.0;
        for pc in [2, 4, 5, 7, 9, 11] {
            weighted.0[pc] = 0.6;
        }
        let analyzer = TonalAnalyzer::new(Box::new(FixedChroma(vec![weighted; 8])));
        let result = analyzer.analyze(&AudioBuffer::new(vec![0.0; 4096], 22050));

        assert_eq!(result.tonic, PitchClass::C);
        assert_eq!(result.raga.raga.number, 29);
        assert_eq!(result.chords.labels.len(), 8);
    }

    #[test]
    fn test_windows_limit_frames() {
        let analyzer = TonalAnalyzer::new(Box::new(FixedChroma(vec![frame(&[0, 4, 7]); 100]))).with_windows(1.0, 0.5);
        let result = analyzer.analyze(&AudioBuffer::new(vec![0.0; 22050 * 3], 22050));
        assert_eq!(result.chords.labels.len(), 1 + 11025 / 512);
    }

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count(30.0, 512, 22050), 1 + 661500 / 512);
        assert_eq!(frame_count(0.0, 512, 22050), 1);
    }
}
