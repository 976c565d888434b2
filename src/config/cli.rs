//! CLI argument parsing and configuration

use crate::types::{StemKind, TrackRef};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ragam - Carnatic music analysis over separated stems
///
/// Separates tracks into vocals, drums, bass and other (cached by content),
/// mixes stems, and reports tonic, melakarta raga, chord progression and a
/// swara transcription.
#[derive(Parser, Debug)]
#[command(name = "ragam")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Root directory for cached stems and mixes
    #[arg(long, global = true, value_name = "DIR", default_value = "data/outputs")]
    pub outputs: PathBuf,

    /// Demucs executable (defaults to `demucs` on PATH)
    #[arg(long, global = true, value_name = "PATH", env = "RAGAM_DEMUCS")]
    pub demucs_bin: Option<PathBuf>,

    /// Basic Pitch executable (defaults to `basic-pitch` on PATH)
    #[arg(long, global = true, value_name = "PATH", env = "RAGAM_BASIC_PITCH")]
    pub basic_pitch_bin: Option<PathBuf>,

    /// Seconds after which another run's separation claim is taken over
    #[arg(long, global = true, value_name = "SECS")]
    pub stale_claim_secs: Option<u64>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress spinners and non-error logs)
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split a track into four stems (served from cache when possible)
    Separate(SeparateArgs),
    /// Separate a track and mix a subset of its stems
    Mix(MixArgs),
    /// Tonic, raga, chords and swara transcription for a track or stem
    Analyze(AnalyzeArgs),
    /// Print the content digest used as the cache key
    Hash(HashArgs),
}

#[derive(Args, Debug)]
pub struct SeparateArgs {
    /// Input audio file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Separation model identifier
    #[arg(long, value_name = "ID")]
    pub model: Option<String>,
}

#[derive(Args, Debug)]
pub struct MixArgs {
    /// Input audio file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Stems to mix, comma separated
    #[arg(long, value_name = "STEMS", value_delimiter = ',', required = true)]
    pub stems: Vec<StemKind>,

    /// Separation model identifier
    #[arg(long, value_name = "ID")]
    pub model: Option<String>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Input audio file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Which track to analyze: original, a stem name, or a path to a mix
    #[arg(long, value_name = "TRACK", default_value = "original")]
    pub track: TrackRef,

    /// Separation model identifier (used when a stem is analyzed)
    #[arg(long, value_name = "ID")]
    pub model: Option<String>,

    /// Also write a JSON report
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Number of swaras shown in the summary line
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct HashArgs {
    /// Input audio file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
}

impl Command {
    /// The input file every subcommand takes
    pub fn input(&self) -> &PathBuf {
        match self {
            Command::Separate(a) => &a.input,
            Command::Mix(a) => &a.input,
            Command::Analyze(a) => &a.input,
            Command::Hash(a) => &a.input,
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            Command::Separate(a) => a.model.as_deref(),
            Command::Mix(a) => a.model.as_deref(),
            Command::Analyze(a) => a.model.as_deref(),
            Command::Hash(_) => None,
        }
    }
}

impl Cli {
    /// Get the log level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mix_stem_list() {
        let cli = Cli::parse_from(["ragam", "mix", "-i", "song.mp3", "--stems", "vocals,bass"]);
        match cli.command {
            Command::Mix(args) => assert_eq!(args.stems, vec![StemKind::Vocals, StemKind::Bass]),
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.outputs, PathBuf::from("data/outputs"));
    }

    #[test]
    fn test_parse_analyze_track() {
        let cli = Cli::parse_from(["ragam", "-vv", "analyze", "-i", "song.wav", "--track", "vocals", "--limit", "10"]);
        assert_eq!(cli.log_level(), tracing::Level::DEBUG);
        match cli.command {
            Command::Analyze(args) => {
                assert_eq!(args.track, TrackRef::Stem(StemKind::Vocals));
                assert_eq!(args.limit, Some(10));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_stale_claim_age() {
        let cli = Cli::parse_from(["ragam", "separate", "-i", "a.wav", "--stale-claim-secs", "90"]);
        assert_eq!(cli.stale_claim_secs, Some(90));
    }

    #[test]
    fn test_unknown_stem_rejected() {
        assert!(Cli::try_parse_from(["ragam", "mix", "-i", "a.wav", "--stems", "piano"]).is_err());
    }
}
