//! Note transcription with a neural primary and a DSP fallback

pub mod aggregator;
pub mod basic_pitch;
pub mod chain;
pub mod pyin;

pub use aggregator::{EventAggregator, MIN_NOTE_SECONDS};
pub use basic_pitch::BasicPitchCommand;
pub use chain::{Transcription, TranscriptionChain, TranscriptionStrategy};
pub use pyin::PyinTranscriber;
