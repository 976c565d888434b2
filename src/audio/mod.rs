//! Audio decoding, resampling and track writing

pub mod decoder;
pub mod writer;

pub use decoder::{decode_mono, decode_track, resample, resample_track, to_mono, ANALYSIS_SAMPLE_RATE};
pub use writer::{TrackWriter, WavTrackWriter};
