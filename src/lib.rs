//! ragam - Carnatic music analysis over separated stems
//!
//! Splits recordings into vocals, drums, bass and other with a content-addressed
//! stem cache, mixes stems, and analyzes any track for its tonic, melakarta raga,
//! chord progression and swara transcription.
//!
//! # Architecture
//!
//! - `config`: CLI argument parsing and runtime settings
//! - `audio`: decoding with symphonia, resampling, the `TrackWriter` capability
//! - `cache`: content hashing, the on-disk stem cache and per-key locking
//! - `separation`: separation backends and the cache-aware orchestrator
//! - `analysis`: chroma and pitch collaborators, tonic, raga, chords, swaras
//! - `transcription`: primary/fallback note transcription
//! - `mixer`: equal-weight stem mixing
//! - `pipeline`: request-level orchestration
//! - `export`: JSON report output
//!
//! # Example
//!
//! ```no_run
//! use ragam::config::Settings;
//! use ragam::pipeline::{AnalysisRequest, Pipeline};
//! use ragam::types::TrackRef;
//!
//! let pipeline = Pipeline::from_settings(Settings::default());
//! let report = pipeline
//!     .analyze(&AnalysisRequest {
//!         input: "song.mp3".into(),
//!         track: TrackRef::Original,
//!     })
//!     .expect("Analysis failed");
//! println!("{} / {}", report.tonic, report.raga.raga);
//! ```

pub mod analysis;
pub mod audio;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod mixer;
pub mod pipeline;
pub mod separation;
pub mod transcription;
pub mod types;

// Re-export key types at crate root
pub use error::{RagamError, Result};
pub use types::{NoteEvent, PitchClass, StemKind, StemSet, Track, TrackRef};
