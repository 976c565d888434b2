//! Deterministic DSP transcription: pitch tracking plus aggregation

use super::aggregator::EventAggregator;
use crate::analysis::pitch::ProbabilisticYin;
use crate::analysis::traits::{NoteTranscriber, PitchTracker};
use crate::audio;
use crate::error::{RagamError, Result};
use crate::types::{AudioBuffer, NoteEvent};
use std::path::Path;
use tracing::debug;

/// Seconds of audio the fallback analyzes
pub const DEFAULT_TRANSCRIPTION_SECONDS: f64 = 60.0;

/// Monophonic transcription over a bounded window
pub struct PyinTranscriber {
    tracker: Box<dyn PitchTracker>,
    aggregator: EventAggregator,
    max_seconds: f64,
}

impl PyinTranscriber {
    pub fn new(tracker: Box<dyn PitchTracker>, max_seconds: f64) -> Self {
        Self {
            tracker,
            aggregator: EventAggregator::default(),
            max_seconds,
        }
    }

    /// Notes from an already decoded buffer
    pub fn transcribe_buffer(&self, buffer: &AudioBuffer) -> Vec<NoteEvent> {
        let frames = self.tracker.track(buffer);
        let events = self.aggregator.from_frames(&frames);
        debug!(
            "{}: {} frames -> {} notes",
            self.tracker.name(),
            frames.len(),
            events.len()
        );
        events
    }
}

impl Default for PyinTranscriber {
    fn default() -> Self {
        Self::new(Box::new(ProbabilisticYin::vocal_range()), DEFAULT_TRANSCRIPTION_SECONDS)
    }
}

impl NoteTranscriber for PyinTranscriber {
    fn transcribe(&self, path: &Path) -> Result<Vec<NoteEvent>> {
        let buffer = audio::decode_mono(path, Some(self.max_seconds)).map_err(|e| RagamError::TranscriptionFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(self.transcribe_buffer(&buffer))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "pyin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn melody(notes: &[(f32, f32)], sr: u32) -> AudioBuffer {
        let mut samples = Vec::new();
        for &(freq, secs) in notes {
            let n = (secs * sr as f32) as usize;
            samples.extend((0..n).map(|i| {
                if freq > 0.0 {
                    0.5 * (2.0 * PI * freq * i as f32 / sr as f32).sin()
                } else {
                    0.0
                }
            }));
        }
        AudioBuffer::new(samples, sr)
    }

    #[test]
    fn test_two_notes_with_gap() {
        // A4, silence, C5
        let buffer = melody(&[(440.0, 0.6), (0.0, 0.3), (523.25, 0.6)], 22050);
        let events = PyinTranscriber::default().transcribe_buffer(&buffer);
        let pitches: Vec<u8> = events.iter().map(|e| e.pitch).collect();
        assert_eq!(pitches, vec![69, 72]);
        assert!(events.iter().all(|e| e.duration() > 0.1));
    }

    #[test]
    fn test_silence_yields_no_notes() {
        let events = PyinTranscriber::default().transcribe_buffer(&AudioBuffer::new(vec![0.0; 22050], 22050));
        assert!(events.is_empty());
    }

    #[test]
    fn test_undecodable_file_is_transcription_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.wav");
        std::fs::write(&path, b"not a wav file").unwrap();
        let err = PyinTranscriber::default().transcribe(&path).unwrap_err();
        assert!(matches!(err, RagamError::TranscriptionFailed { .. }));
    }
}
