//! Track persistence
//!
//! Separation models and the mixer never touch a file format directly; they
//! hand finished [`Track`]s to a [`TrackWriter`]. Swapping the writer changes
//! how waveforms land on disk without touching the callers.

use crate::error::{RagamError, Result};
use crate::types::Track;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persists decoded waveforms
pub trait TrackWriter: Send + Sync {
    /// Write `track` to `path`, replacing any existing file
    ///
    /// Implementations must never leave a partially written file at `path`.
    fn write(&self, path: &Path, track: &Track) -> Result<()>;

    /// Get the name of this writer (for logging)
    fn name(&self) -> &'static str;
}

/// 16-bit PCM WAV writer using hound
#[derive(Debug, Clone, Copy, Default)]
pub struct WavTrackWriter;

impl WavTrackWriter {
    pub fn new() -> Self {
        Self
    }
}

impl TrackWriter for WavTrackWriter {
    fn write(&self, path: &Path, track: &Track) -> Result<()> {
        let temp_path = temp_path_for(path);

        if let Err(e) = write_wav_16(&temp_path, track) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }

        // Atomic rename: either succeeds completely or fails without modifying target
        std::fs::rename(&temp_path, path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            RagamError::OutputError {
                path: path.to_path_buf(),
                reason: format!("Failed to finalize file: {}", e),
            }
        })?;

        debug!("Wrote {:.2}s track to {}", track.duration(), path.display());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "wav-pcm16"
    }
}

/// Sibling temp file on the same filesystem, so the final rename is atomic
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_wav_16(path: &Path, track: &Track) -> Result<()> {
    let spec = hound::WavSpec {
        channels: track.channels.max(1),
        sample_rate: track.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let output_err = |what: &str, e: hound::Error| RagamError::OutputError {
        path: path.to_path_buf(),
        reason: format!("{}: {}", what, e),
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| output_err("Failed to create WAV file", e))?;

    for &sample in &track.samples {
        let value = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer
            .write_sample(value)
            .map_err(|e| output_err("Failed to write sample", e))?;
    }

    writer.finalize().map_err(|e| output_err("Failed to finalize WAV", e))?;
    Ok(())
}
