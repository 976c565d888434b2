//! Backend trait abstractions
//!
//! Every external collaborator sits behind one of these traits so the pipeline
//! can swap a neural model for a command-line tool, or either for a test fake.

use crate::audio::TrackWriter;
use crate::error::Result;
use crate::types::{AudioBuffer, ChromaVector, NoteEvent};
use std::path::{Path, PathBuf};

/// Frame-wise pitch-class energy extraction
pub trait ChromaExtractor: Send + Sync {
    /// One chroma frame per hop; each frame scaled so its maximum is 1 (silent frames stay 0)
    fn chromagram(&self, buffer: &AudioBuffer) -> Vec<ChromaVector>;

    /// Hop length in samples, for frame-to-time conversion
    fn hop_length(&self) -> usize;

    /// Get the name of this extractor (for logging)
    fn name(&self) -> &'static str;
}

/// One analysis frame of a monophonic pitch track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchFrame {
    /// Frame centre in seconds
    pub time: f64,
    /// Fundamental frequency in Hz, NaN when unvoiced
    pub f0: f32,
    pub voiced: bool,
    /// Probability that the frame is voiced
    pub voiced_prob: f32,
}

/// Monophonic fundamental-frequency tracking
pub trait PitchTracker: Send + Sync {
    fn track(&self, buffer: &AudioBuffer) -> Vec<PitchFrame>;

    /// Get the name of this tracker (for logging)
    fn name(&self) -> &'static str;
}

/// Polyphonic note transcription from a file
pub trait NoteTranscriber: Send + Sync {
    /// Note events for the file; may fail, callers decide how to recover
    fn transcribe(&self, path: &Path) -> Result<Vec<NoteEvent>>;

    /// Check if the backend can run here (binary present, model loaded)
    fn is_available(&self) -> bool;

    /// Get the name of this transcriber (for logging)
    fn name(&self) -> &'static str;
}

/// What a separation backend is asked to do
#[derive(Debug, Clone)]
pub struct SeparationRequest {
    pub input: PathBuf,
    pub model_id: String,
    /// Scratch root; the model may nest its output anywhere below it
    pub output_root: PathBuf,
}

/// Source separation backend
pub trait SeparationModel: Send + Sync {
    /// Write one file per stem (vocals, drums, bass, other) somewhere under
    /// `request.output_root`. In-process models persist through `writer`.
    fn separate(&self, request: &SeparationRequest, writer: &dyn TrackWriter) -> Result<()>;

    /// Check if the separator is available (binary found, model loaded, ...)
    fn is_available(&self) -> bool;

    /// Get the name of this separator (for logging)
    fn name(&self) -> &'static str;
}
