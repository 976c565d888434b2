//! Basic Pitch neural transcription through its command-line tool
//!
//! `basic-pitch <out dir> <input> --save-note-events` writes a CSV of
//! `start_time_s, end_time_s, pitch_midi, velocity, ...` rows that we read back.

use crate::analysis::traits::NoteTranscriber;
use crate::error::{RagamError, Result};
use crate::types::NoteEvent;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Executable looked up on `PATH` when no override is given
pub const BASIC_PITCH_BIN: &str = "basic-pitch";

/// Fixed model thresholds
pub const ONSET_THRESHOLD: f32 = 0.5;
pub const FRAME_THRESHOLD: f32 = 0.3;
pub const MIN_NOTE_LENGTH_MS: f32 = 58.0;

#[derive(Debug, Clone)]
pub struct BasicPitchCommand {
    binary: Option<PathBuf>,
}

impl BasicPitchCommand {
    /// Resolve the executable once; `override_bin` wins over `PATH`
    pub fn probe(override_bin: Option<&Path>) -> Self {
        let binary = match override_bin {
            Some(path) => which::which(path).ok(),
            None => which::which(BASIC_PITCH_BIN).ok(),
        };
        debug!("basic-pitch: {:?}", binary);
        Self { binary }
    }

    pub fn arguments(out_dir: &Path, input: &Path) -> Vec<std::ffi::OsString> {
        vec![
            out_dir.as_os_str().to_os_string(),
            input.as_os_str().to_os_string(),
            "--save-note-events".into(),
            "--onset-threshold".into(),
            ONSET_THRESHOLD.to_string().into(),
            "--frame-threshold".into(),
            FRAME_THRESHOLD.to_string().into(),
            "--minimum-note-length".into(),
            MIN_NOTE_LENGTH_MS.to_string().into(),
        ]
    }
}

impl NoteTranscriber for BasicPitchCommand {
    fn transcribe(&self, path: &Path) -> Result<Vec<NoteEvent>> {
        let failed = |reason: String| RagamError::TranscriptionFailed {
            path: path.to_path_buf(),
            reason,
        };

        let binary = self
            .binary
            .as_ref()
            .ok_or_else(|| failed("basic-pitch executable not found".to_string()))?;

        let out_dir = tempfile::tempdir().map_err(|e| failed(format!("Cannot create scratch dir: {}", e)))?;

        let output = Command::new(binary)
            .args(Self::arguments(out_dir.path(), path))
            .output()
            .map_err(|e| failed(format!("Failed to launch basic-pitch: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!(
                "basic-pitch exited with {}: {}",
                output.status,
                stderr.lines().last().unwrap_or_default()
            )));
        }

        let csv_path = std::fs::read_dir(out_dir.path())
            .map_err(|e| failed(e.to_string()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .find(|p| p.extension().is_some_and(|ext| ext == "csv"))
            .ok_or_else(|| failed("basic-pitch produced no note-event CSV".to_string()))?;

        let file = std::fs::File::open(&csv_path).map_err(|e| failed(e.to_string()))?;
        parse_note_events(file).map_err(|e| failed(format!("Malformed note events: {}", e)))
    }

    fn is_available(&self) -> bool {
        self.binary.is_some()
    }

    fn name(&self) -> &'static str {
        "basic-pitch"
    }
}

/// Read `start, end, pitch` from note-event CSV rows
///
/// Columns are found by header name when present, else by position. Trailing
/// pitch-bend columns vary in count and are ignored.
pub fn parse_note_events<R: std::io::Read>(reader: R) -> std::result::Result<Vec<NoteEvent>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |name: &str, fallback: usize| headers.iter().position(|h| h == name).unwrap_or(fallback);
    let (start_col, end_col, pitch_col) = (column("start_time_s", 0), column("end_time_s", 1), column("pitch_midi", 2));

    let mut events = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let field = |i: usize| record.get(i).and_then(|v| v.parse::<f64>().ok());
        if let (Some(start), Some(end), Some(pitch)) = (field(start_col), field(end_col), field(pitch_col)) {
            if (0.0..=127.0).contains(&pitch.round()) {
                events.push(NoteEvent::new(start, end, pitch.round() as u8));
            }
        }
    }
    Ok(events)
}
