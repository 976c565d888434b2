//! Frame contour to note events
//!
//! Consecutive voiced frames with the same rounded MIDI pitch form one note.
//! A note opens at its first frame's time and closes at the time of the frame
//! that ends it (unvoiced, NaN, or a different pitch); a note still open at the
//! end closes at the last frame's time. Notes of 100 ms or less are dropped
//! once the scan is done.

use crate::analysis::pitch::hz_to_midi;
use crate::analysis::traits::PitchFrame;
use crate::types::NoteEvent;

/// Notes must last strictly longer than this (seconds)
pub const MIN_NOTE_SECONDS: f64 = 0.1;

/// Coalesces frame-level pitch into note events
#[derive(Debug, Clone, Copy)]
pub struct EventAggregator {
    min_duration: f64,
}

impl Default for EventAggregator {
    fn default() -> Self {
        Self {
            min_duration: MIN_NOTE_SECONDS,
        }
    }
}

impl EventAggregator {
    pub fn new(min_duration: f64) -> Self {
        Self { min_duration }
    }

    /// Notes from pitch-tracker frames
    pub fn from_frames(&self, frames: &[PitchFrame]) -> Vec<NoteEvent> {
        let times: Vec<f64> = frames.iter().map(|f| f.time).collect();
        let pitches: Vec<Option<u8>> = frames
            .iter()
            .map(|f| if f.voiced { hz_to_midi(f.f0) } else { None })
            .collect();
        self.aggregate(&times, &pitches)
    }

    /// Notes from parallel time and pitch sequences (`None` = unvoiced)
    pub fn aggregate(&self, times: &[f64], pitches: &[Option<u8>]) -> Vec<NoteEvent> {
        let mut events = Vec::new();
        let mut open: Option<(f64, u8)> = None;

        for (&time, &pitch) in times.iter().zip(pitches) {
            match (open, pitch) {
                (Some((start, current)), None) => {
                    events.push(NoteEvent::new(start, time, current));
                    open = None;
                }
                (Some((start, current)), Some(p)) if p != current => {
                    events.push(NoteEvent::new(start, time, current));
                    open = Some((time, p));
                }
                (None, Some(p)) => open = Some((time, p)),
                _ => {}
            }
        }

        if let (Some((start, current)), Some(&last)) = (open, times.last()) {
            events.push(NoteEvent::new(start, last, current));
        }

        events.retain(|e| e.duration() > self.min_duration);
        events
    }
}
