//! Demucs command-line separator
//!
//! Runs `demucs --out <root> -n <model> --jobs 1 <input>`. Demucs nests its
//! output as `<root>/<model>/<input stem>/<stem>.wav`; the orchestrator
//! flattens that layout, so nothing here depends on it.

use crate::analysis::traits::{SeparationModel, SeparationRequest};
use crate::audio::TrackWriter;
use crate::error::{RagamError, Result};
use crate::types::AudioFormat;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Executable looked up on `PATH` when no override is given
pub const DEMUCS_BIN: &str = "demucs";

/// Lines of demucs stderr kept in error reports
const STDERR_TAIL_LINES: usize = 12;

/// Separation through an installed demucs executable
#[derive(Debug, Clone)]
pub struct DemucsCommand {
    binary: Option<PathBuf>,
}

impl DemucsCommand {
    /// Resolve the executable once; `override_bin` wins over `PATH`
    pub fn probe(override_bin: Option<&Path>) -> Self {
        let binary = match override_bin {
            Some(path) => which::which(path).ok(),
            None => which::which(DEMUCS_BIN).ok(),
        };

        match &binary {
            Some(path) => debug!("Found demucs at {}", path.display()),
            None => debug!("demucs executable not found"),
        }

        Self { binary }
    }

    /// Use an explicit executable without probing
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: Some(binary.into()),
        }
    }

    /// Arguments for one run, low-memory preset (one job)
    pub fn arguments(request: &SeparationRequest) -> Vec<std::ffi::OsString> {
        vec![
            "--out".into(),
            request.output_root.clone().into_os_string(),
            "-n".into(),
            request.model_id.clone().into(),
            "--jobs".into(),
            "1".into(),
            request.input.clone().into_os_string(),
        ]
    }

    fn check_codec_toolchain(&self, input: &Path) -> Result<()> {
        let needs_ffmpeg = AudioFormat::from_path(input).map_or(true, AudioFormat::needs_ffmpeg);
        if needs_ffmpeg && which::which("ffmpeg").is_err() {
            return Err(RagamError::separation_failed(
                input,
                "FFmpeg not found on PATH. Install FFmpeg so demucs can read this format",
            ));
        }
        Ok(())
    }
}

impl SeparationModel for DemucsCommand {
    fn separate(&self, request: &SeparationRequest, _writer: &dyn TrackWriter) -> Result<()> {
        let binary = self.binary.as_ref().ok_or_else(|| {
            RagamError::separation_failed(
                &request.input,
                "demucs executable not found. Install it (pip install demucs) or pass --demucs-bin",
            )
        })?;

        self.check_codec_toolchain(&request.input)?;

        info!(
            "Running demucs ({}) on {}",
            request.model_id,
            request.input.display()
        );

        let output = Command::new(binary)
            .args(Self::arguments(request))
            .output()
            .map_err(|e| RagamError::separation_failed(&request.input, format!("Failed to launch demucs: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(STDERR_TAIL_LINES).collect();
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            return Err(RagamError::separation_failed(
                &request.input,
                format!("demucs exited with {}:\n{}", output.status, tail.join("\n")),
            ));
        }

        Ok(())
    }

    fn is_available(&self) -> bool {
        self.binary.is_some()
    }

    fn name(&self) -> &'static str {
        "demucs-cli"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::WavTrackWriter;

    fn request() -> SeparationRequest {
        SeparationRequest {
            input: PathBuf::from("/music/song.wav"),
            model_id: "mdx_extra_q".to_string(),
            output_root: PathBuf::from("/tmp/stage"),
        }
    }

    #[test]
    fn test_arguments_use_low_memory_preset() {
        let args: Vec<String> = DemucsCommand::arguments(&request())
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            ["--out", "/tmp/stage", "-n", "mdx_extra_q", "--jobs", "1", "/music/song.wav"]
        );
    }

    #[test]
    fn test_missing_binary_is_separation_failure() {
        let model = DemucsCommand::probe(Some(Path::new("/nonexistent/demucs-binary")));
        assert!(!model.is_available());

        let err = model.separate(&request(), &WavTrackWriter::new()).unwrap_err();
        assert!(matches!(err, RagamError::SeparationFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_carries_stderr() {
        // `false` ignores its arguments and exits 1
        let model = DemucsCommand::with_binary("false");
        let err = model.separate(&request(), &WavTrackWriter::new()).unwrap_err();
        assert!(err.to_string().contains("demucs exited with"));
    }
}
