//! Unified error types for ragam
//!
//! Error strategy:
//! - Request errors (hashing, separation, analysis): fatal for the current stage
//! - Per-input errors inside a stage (primary transcription, one mix input):
//!   recovered locally and only logged
//!
//! All errors include actionable suggestions where possible.

use std::path::PathBuf;
use thiserror::Error;

/// Supported audio formats for helpful error messages
pub const SUPPORTED_FORMATS: &str = "MP3, WAV, FLAC, AIFF, OGG";

/// Top-level error type for ragam operations
#[derive(Debug, Error)]
pub enum RagamError {
    // =========================================================================
    // Fatal errors - abort the current request
    // =========================================================================
    #[error("Cannot hash input '{path}': {reason}\n  Tip: Check the file exists and is readable")]
    HashingFailed { path: PathBuf, reason: String },

    #[error("Stem separation failed for '{path}': {reason}")]
    SeparationFailed { path: PathBuf, reason: String },

    #[error("Transcription failed for '{path}': {reason}")]
    TranscriptionFailed { path: PathBuf, reason: String },

    #[error("Analysis failed for '{path}': {reason}")]
    AnalysisFailed { path: PathBuf, reason: String },

    #[error("Failed to decode audio file '{path}': {reason}\n  Supported formats: {SUPPORTED_FORMATS}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Cannot write output to '{path}': {reason}\n  Tip: Check write permissions for the output directory")]
    OutputError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // Recoverable errors - reported, never abort
    // =========================================================================
    #[error("Skipped mix input '{path}': {reason}")]
    MixSkipped { path: PathBuf, reason: String },
}

/// Result type alias for ragam operations
pub type Result<T> = std::result::Result<T, RagamError>;

impl RagamError {
    /// Returns true if this error is recovered inside its stage
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RagamError::MixSkipped { .. })
    }

    /// Returns true if this error aborts the current request
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Create a decode error with context about the issue
    pub fn decode_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RagamError::DecodeError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a separation failure carrying the underlying cause
    pub fn separation_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RagamError::SeparationFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an output error, checking for common issues
    pub fn output_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check that you have write access to {}", path.display())
            }
            std::io::ErrorKind::NotFound => {
                format!(
                    "Directory does not exist: {}",
                    path.parent().map(|p| p.display().to_string()).unwrap_or_default()
                )
            }
            std::io::ErrorKind::AlreadyExists => {
                format!("File already exists: {}", path.display())
            }
            _ => err.to_string(),
        };
        RagamError::OutputError { path, reason }
    }

    /// Re-label an error as a separation failure, keeping its message as the cause
    pub fn into_separation_failure(self, path: &std::path::Path) -> Self {
        match self {
            e @ RagamError::SeparationFailed { .. } => e,
            other => RagamError::SeparationFailed {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        }
    }
}

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error about which file was being analyzed
    fn with_file_context(self, path: &std::path::Path) -> Result<T>;
}

impl<T, E: std::fmt::Display> ErrorContext<T> for std::result::Result<T, E> {
    fn with_file_context(self, path: &std::path::Path) -> Result<T> {
        self.map_err(|e| RagamError::AnalysisFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_skipped_is_only_recoverable_error() {
        let skipped = RagamError::MixSkipped {
            path: PathBuf::from("a.wav"),
            reason: "bad header".into(),
        };
        assert!(skipped.is_recoverable());
        assert!(!skipped.is_fatal());

        let failed = RagamError::separation_failed("a.wav", "demucs exited with 1");
        assert!(failed.is_fatal());
    }

    #[test]
    fn test_output_error_permission_hint() {
        let err = RagamError::output_error(
            "/root/out.wav",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(err.to_string().contains("Permission denied"));
    }

    #[test]
    fn test_into_separation_failure_keeps_cause() {
        let err = RagamError::decode_error("x.mp3", "truncated frame")
            .into_separation_failure(std::path::Path::new("x.mp3"));
        match err {
            RagamError::SeparationFailed { reason, .. } => assert!(reason.contains("truncated frame")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
