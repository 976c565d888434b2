//! Primary-then-fallback transcription
//!
//! The strategy is chosen once, when the chain is built, by probing the primary
//! backend. A primary failure at call time is logged and the fallback runs;
//! only a fallback failure reaches the caller.

use super::basic_pitch::BasicPitchCommand;
use super::pyin::PyinTranscriber;
use crate::analysis::traits::NoteTranscriber;
use crate::error::Result;
use crate::types::NoteEvent;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Which backend a chain starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionStrategy {
    /// Neural model, falling back on failure
    Primary,
    /// DSP pitch tracking only
    Fallback,
}

impl fmt::Display for TranscriptionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptionStrategy::Primary => f.write_str("primary"),
            TranscriptionStrategy::Fallback => f.write_str("fallback"),
        }
    }
}

/// Notes plus the backend that actually produced them
#[derive(Debug, Clone)]
pub struct Transcription {
    pub events: Vec<NoteEvent>,
    pub produced_by: TranscriptionStrategy,
    pub backend: &'static str,
}

pub struct TranscriptionChain {
    strategy: TranscriptionStrategy,
    primary: Box<dyn NoteTranscriber>,
    fallback: Box<dyn NoteTranscriber>,
}

impl TranscriptionChain {
    /// Probe `primary` once and fix the strategy
    pub fn probe(primary: Box<dyn NoteTranscriber>, fallback: Box<dyn NoteTranscriber>) -> Self {
        let strategy = if primary.is_available() {
            TranscriptionStrategy::Primary
        } else {
            TranscriptionStrategy::Fallback
        };
        info!(
            "Transcription strategy: {} ({} -> {})",
            strategy,
            primary.name(),
            fallback.name()
        );
        Self {
            strategy,
            primary,
            fallback,
        }
    }

    /// Basic Pitch if installed, pYIN otherwise
    pub fn detect(basic_pitch_bin: Option<&Path>, max_seconds: f64) -> Self {
        Self::probe(
            Box::new(BasicPitchCommand::probe(basic_pitch_bin)),
            Box::new(PyinTranscriber::new(
                Box::new(crate::analysis::ProbabilisticYin::vocal_range()),
                max_seconds,
            )),
        )
    }

    pub fn strategy(&self) -> TranscriptionStrategy {
        self.strategy
    }

    pub fn transcribe(&self, path: &Path) -> Result<Transcription> {
        if self.strategy == TranscriptionStrategy::Primary {
            match self.primary.transcribe(path) {
                Ok(events) => {
                    return Ok(Transcription {
                        events: clean_events(events),
                        produced_by: TranscriptionStrategy::Primary,
                        backend: self.primary.name(),
                    });
                }
                Err(e) => {
                    warn!("{} failed, falling back to {}: {}", self.primary.name(), self.fallback.name(), e);
                }
            }
        }

        let events = self.fallback.transcribe(path)?;
        Ok(Transcription {
            events: clean_events(events),
            produced_by: TranscriptionStrategy::Fallback,
            backend: self.fallback.name(),
        })
    }
}

/// Drop events with `end <= start` and order by onset
fn clean_events(mut events: Vec<NoteEvent>) -> Vec<NoteEvent> {
    events.retain(|e| e.end > e.start && e.start.is_finite() && e.end.is_finite());
    events.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.pitch.cmp(&b.pitch)));
    events
}
