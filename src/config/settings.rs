//! Runtime configuration settings

use crate::analysis::{DEFAULT_ANALYSIS_SECONDS, DEFAULT_CHORD_SECONDS};
use crate::cache::DEFAULT_STALE_CLAIM_SECS;
use crate::transcription::pyin::DEFAULT_TRANSCRIPTION_SECONDS;
use std::path::PathBuf;
use std::time::Duration;

/// Separation model used when none is requested
pub const DEFAULT_MODEL_ID: &str = "mdx_extra_q";

/// Swaras shown in the summary line
pub const DEFAULT_DISPLAY_LIMIT: usize = 30;

/// Runtime settings shared by every pipeline stage
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root of the stem cache and mix outputs
    pub outputs_root: PathBuf,
    /// Separation model identifier
    pub model_id: String,
    /// Seconds of audio used for tonic and raga estimation
    pub analysis_seconds: f64,
    /// Seconds of audio used for chord detection
    pub chord_seconds: f64,
    /// Seconds of audio the pitch-tracking fallback transcribes
    pub transcription_seconds: f64,
    /// Swaras shown in the summary line
    pub display_limit: usize,
    /// Demucs executable override
    pub demucs_bin: Option<PathBuf>,
    /// Basic Pitch executable override
    pub basic_pitch_bin: Option<PathBuf>,
    /// Age after which another run's separation claim is taken over
    pub claim_stale_after: Duration,
    /// Show progress spinners
    pub show_progress: bool,
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_cli(cli: &super::cli::Cli) -> Self {
        let defaults = Self::default();
        let display_limit = match &cli.command {
            super::cli::Command::Analyze(args) => args.limit.unwrap_or(defaults.display_limit),
            _ => defaults.display_limit,
        };

        Self {
            outputs_root: cli.outputs.clone(),
            model_id: cli.command.model().map(str::to_string).unwrap_or(defaults.model_id),
            display_limit,
            demucs_bin: cli.demucs_bin.clone(),
            basic_pitch_bin: cli.basic_pitch_bin.clone(),
            claim_stale_after: cli
                .stale_claim_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.claim_stale_after),
            show_progress: !cli.quiet,
            ..defaults
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            outputs_root: PathBuf::from("data/outputs"),
            model_id: DEFAULT_MODEL_ID.to_string(),
            analysis_seconds: DEFAULT_ANALYSIS_SECONDS,
            chord_seconds: DEFAULT_CHORD_SECONDS,
            transcription_seconds: DEFAULT_TRANSCRIPTION_SECONDS,
            display_limit: DEFAULT_DISPLAY_LIMIT,
            demucs_bin: None,
            basic_pitch_bin: None,
            claim_stale_after: Duration::from_secs(DEFAULT_STALE_CLAIM_SECS),
            show_progress: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cli;
    use clap::Parser;

    #[test]
    fn test_from_cli_overrides() {
        let cli = Cli::parse_from([
            "ragam", "-q", "--outputs", "/tmp/out", "analyze", "-i", "a.wav", "--model", "htdemucs", "--limit", "5",
        ]);
        let settings = Settings::from_cli(&cli);
        assert_eq!(settings.outputs_root, PathBuf::from("/tmp/out"));
        assert_eq!(settings.model_id, "htdemucs");
        assert_eq!(settings.display_limit, 5);
        assert!(!settings.show_progress);
        assert_eq!(settings.analysis_seconds, 60.0);
    }

    #[test]
    fn test_defaults_for_other_commands() {
        let cli = Cli::parse_from(["ragam", "separate", "-i", "a.wav"]);
        let settings = Settings::from_cli(&cli);
        assert_eq!(settings.model_id, DEFAULT_MODEL_ID);
        assert_eq!(settings.display_limit, DEFAULT_DISPLAY_LIMIT);
        assert_eq!(settings.claim_stale_after, Duration::from_secs(DEFAULT_STALE_CLAIM_SECS));
    }

    #[test]
    fn test_stale_claim_age_from_cli() {
        let cli = Cli::parse_from(["ragam", "--stale-claim-secs", "600", "mix", "-i", "a.wav", "--stems", "vocals"]);
        assert_eq!(Settings::from_cli(&cli).claim_stale_after, Duration::from_secs(600));
    }
}
