//! Tonic-relative Carnatic note names
//!
//! `(midi - tonic) mod 12` indexes a fixed table of the twelve swarasthanas.

use crate::types::{NoteEvent, PitchClass};
use serde::Serialize;

/// Swara label for each semitone above Sa
pub const CARNATIC_SWARAS: [&str; 12] = [
    "S",  // Shadjam
    "R1", // Shuddha Rishabham
    "R2", // Chatusruti Rishabham
    "G2", // Sadharana Gandharam
    "G3", // Antara Gandharam
    "M1", // Shuddha Madhyamam
    "M2", // Prati Madhyamam
    "P",  // Panchamam
    "D1", // Shuddha Dhaivatam
    "D2", // Chatusruti Dhaivatam
    "N2", // Kaisiki Nishadam
    "N3", // Kakali Nishadam
];

/// Shown if an interval ever falls outside the table
pub const UNKNOWN_SWARA: &str = "?";

/// Swara for a MIDI note against a tonic pitch class
pub fn note_to_swara(midi: u8, tonic: PitchClass) -> &'static str {
    let interval = (midi as i32 - tonic.to_index() as i32).rem_euclid(12) as usize;
    CARNATIC_SWARAS.get(interval).copied().unwrap_or(UNKNOWN_SWARA)
}

/// Space-separated swaras, one per event, in event order
pub fn format_swara_sequence(events: &[NoteEvent], tonic: PitchClass) -> String {
    events
        .iter()
        .map(|e| note_to_swara(e.pitch, tonic))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Scientific pitch name with sharps, e.g. 60 -> "C4"
pub fn midi_to_western(midi: u8) -> String {
    let octave = midi as i32 / 12 - 1;
    format!("{}{}", PitchClass::from_midi(midi), octave)
}

/// One line of the detailed note table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteRow {
    pub start: f64,
    pub end: f64,
    pub midi: u8,
    pub western: String,
    pub swara: &'static str,
}

impl NoteRow {
    /// "1.25s - 1.80s"
    pub fn time_range(&self) -> String {
        format!("{:.2}s - {:.2}s", self.start, self.end)
    }
}

/// Detailed rows for every event
pub fn note_table(events: &[NoteEvent], tonic: PitchClass) -> Vec<NoteRow> {
    events
        .iter()
        .map(|e| NoteRow {
            start: e.start,
            end: e.end,
            midi: e.pitch,
            western: midi_to_western(e.pitch),
            swara: note_to_swara(e.pitch, tonic),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_c_major_against_c() {
        let swaras: Vec<&str> = [60u8, 62, 64, 65, 67, 69, 71]
            .iter()
            .map(|&m| note_to_swara(m, PitchClass::C))
            .collect();
        assert_eq!(swaras.join(" "), "S R2 G3 M1 P D2 N3");
    }

    #[test]
    fn test_tonic_below_note_wraps() {
        assert_eq!(note_to_swara(59, PitchClass::C), "N3");
        assert_eq!(note_to_swara(0, PitchClass::B), "R1");
        assert_eq!(note_to_swara(62, PitchClass::D), "S");
    }

    #[test]
    fn test_midi_to_western() {
        assert_eq!(midi_to_western(60), "C4");
        assert_eq!(midi_to_western(69), "A4");
        assert_eq!(midi_to_western(61), "C#4");
        assert_eq!(midi_to_western(0), "C-1");
    }

    #[test]
    fn test_note_table_rows() {
        let rows = note_table(&[NoteEvent::new(1.25, 1.8, 67)], PitchClass::C);
        assert_eq!(rows[0].western, "G4");
        assert_eq!(rows[0].swara, "P");
        assert_eq!(rows[0].time_range(), "1.25s - 1.80s");
    }

    #[test]
    fn test_empty_sequence() {
        assert_eq!(format_swara_sequence(&[], PitchClass::A), "");
    }

    proptest! {
        #[test]
        fn prop_period_twelve(midi in 0u8..116, tonic in 0usize..12) {
            let tonic = PitchClass::from_index(tonic);
            prop_assert_eq!(note_to_swara(midi, tonic), note_to_swara(midi + 12, tonic));
        }

        #[test]
        fn prop_one_token_per_event(pitches in proptest::collection::vec(0u8..128, 0..40)) {
            let events: Vec<NoteEvent> = pitches
                .iter()
                .enumerate()
                .map(|(i, &p)| NoteEvent::new(i as f64, i as f64 + 0.5, p))
                .collect();
            let text = format_swara_sequence(&events, PitchClass::C);
            let tokens: Vec<&str> = text.split_whitespace().collect();
            prop_assert_eq!(tokens.len(), events.len());
            for (token, event) in tokens.iter().zip(&events) {
                prop_assert_eq!(*token, note_to_swara(event.pitch, PitchClass::C));
            }
        }
    }
}
