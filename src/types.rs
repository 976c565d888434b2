//! Core data types for ragam
//!
//! These types represent the domain model and flow through the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// =============================================================================
// Musical primitives
// =============================================================================

/// The 12 pitch classes in Western music
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Cs, // C#/Db
    D,
    Ds, // D#/Eb
    E,
    F,
    Fs, // F#/Gb
    G,
    Gs, // G#/Ab
    A,
    As, // A#/Bb
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Convert from numeric index, wrapping modulo 12 (0 = C, 1 = C#, ..., 11 = B)
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 12]
    }

    /// Convert to numeric index (0 = C, 1 = C#, ..., 11 = B)
    pub fn to_index(self) -> usize {
        self as usize
    }

    /// Pitch class of a MIDI note number
    pub fn from_midi(midi: u8) -> Self {
        Self::from_index(midi as usize)
    }

    /// Standard notation with sharps (e.g., "C", "F#")
    pub fn to_standard_notation(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_standard_notation())
    }
}

/// Triad quality used by chord templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    Major,
    Minor,
}

impl ChordQuality {
    /// Semitone offsets of root, third and fifth
    pub fn intervals(self) -> [usize; 3] {
        match self {
            ChordQuality::Major => [0, 4, 7],
            ChordQuality::Minor => [0, 3, 7],
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            ChordQuality::Major => "Maj",
            ChordQuality::Minor => "Min",
        }
    }
}

/// A per-frame chord decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordLabel {
    Triad { root: PitchClass, quality: ChordQuality },
    /// Frame energy too low to call a chord
    NoChord,
}

impl fmt::Display for ChordLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChordLabel::Triad { root, quality } => write!(f, "{} {}", root, quality.suffix()),
            ChordLabel::NoChord => f.write_str("N/A"),
        }
    }
}

/// 12 non-negative pitch-class energies, index 0 = C
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChromaVector(pub [f32; 12]);

impl ChromaVector {
    /// Index of the strongest pitch class; the first maximum wins on ties
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for (i, &v) in self.0.iter().enumerate() {
            if v > self.0[best] {
                best = i;
            }
        }
        best
    }

    pub fn max(&self) -> f32 {
        self.0.iter().cloned().fold(0.0, f32::max)
    }

    /// Rotate so that `offset` lands at index 0
    pub fn rotated(&self, offset: usize) -> Self {
        let mut out = [0.0; 12];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.0[(i + offset) % 12];
        }
        ChromaVector(out)
    }

    /// Element-wise mean of a sequence of frames
    pub fn mean(frames: &[ChromaVector]) -> Self {
        let mut acc = [0.0f32; 12];
        if frames.is_empty() {
            return ChromaVector(acc);
        }
        for frame in frames {
            for (a, v) in acc.iter_mut().zip(frame.0.iter()) {
                *a += v;
            }
        }
        for a in acc.iter_mut() {
            *a /= frames.len() as f32;
        }
        ChromaVector(acc)
    }
}

// =============================================================================
// Notes
// =============================================================================

/// A transcribed note: `end > start`, pitch as MIDI number
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub start: f64,
    pub end: f64,
    pub pitch: u8,
}

impl NoteEvent {
    pub fn new(start: f64, end: f64, pitch: u8) -> Self {
        Self { start, end, pitch }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

// =============================================================================
// Stems and tracks
// =============================================================================

/// The fixed set of sources produced by separation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemKind {
    Vocals,
    Drums,
    Bass,
    Other,
}

impl StemKind {
    /// Model output order (vocals, drums, bass, other)
    pub const ALL: [StemKind; 4] = [StemKind::Vocals, StemKind::Drums, StemKind::Bass, StemKind::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            StemKind::Vocals => "vocals",
            StemKind::Drums => "drums",
            StemKind::Bass => "bass",
            StemKind::Other => "other",
        }
    }

    /// Canonical file name inside a cache entry
    pub fn file_name(self) -> String {
        format!("{}.wav", self.as_str())
    }
}

impl fmt::Display for StemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StemKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vocals" => Ok(StemKind::Vocals),
            "drums" => Ok(StemKind::Drums),
            "bass" => Ok(StemKind::Bass),
            "other" => Ok(StemKind::Other),
            other => Err(format!("unknown stem '{}', expected vocals, drums, bass or other", other)),
        }
    }
}

/// Paths to the four stems of one cache entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StemSet {
    pub dir: PathBuf,
    pub vocals: PathBuf,
    pub drums: PathBuf,
    pub bass: PathBuf,
    pub other: PathBuf,
}

impl StemSet {
    /// Canonical stem paths under `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            vocals: dir.join(StemKind::Vocals.file_name()),
            drums: dir.join(StemKind::Drums.file_name()),
            bass: dir.join(StemKind::Bass.file_name()),
            other: dir.join(StemKind::Other.file_name()),
        }
    }

    pub fn get(&self, kind: StemKind) -> &Path {
        match kind {
            StemKind::Vocals => &self.vocals,
            StemKind::Drums => &self.drums,
            StemKind::Bass => &self.bass,
            StemKind::Other => &self.other,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (StemKind, &Path)> {
        StemKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    /// True iff every stem file exists on disk
    pub fn is_complete(&self) -> bool {
        self.iter().all(|(_, p)| p.is_file())
    }
}

/// Which track an analysis request targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackRef {
    /// The uploaded recording itself
    #[default]
    Original,
    /// One separated source
    Stem(StemKind),
    /// A derived track such as a user mix
    Mix(PathBuf),
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackRef::Original => f.write_str("original"),
            TrackRef::Stem(kind) => write!(f, "{}", kind),
            TrackRef::Mix(path) => write!(f, "mix ({})", path.display()),
        }
    }
}

impl FromStr for TrackRef {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("original") {
            return Ok(TrackRef::Original);
        }
        if let Ok(kind) = trimmed.parse::<StemKind>() {
            return Ok(TrackRef::Stem(kind));
        }
        // Anything path-shaped names a derived track on disk
        let path = Path::new(trimmed);
        if path.extension().is_some() || path.components().count() > 1 {
            return Ok(TrackRef::Mix(path.to_path_buf()));
        }
        Err(format!(
            "unknown track '{}', expected original, vocals, drums, bass, other or a path to a mix",
            s
        ))
    }
}

// =============================================================================
// Audio buffer types
// =============================================================================

/// Decoded mono samples ready for analysis
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Mono samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        // Guard against division by zero - use 0 duration for invalid sample rate
        let duration = if sample_rate > 0 {
            samples.len() as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            samples,
            sample_rate,
            duration,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A decoded waveform at its native rate and channel count
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub channels: u16,
    pub sample_rate: u32,
    /// Interleaved samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
}

impl Track {
    pub fn new(channels: u16, sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            channels,
            sample_rate,
            samples,
        }
    }

    /// Build an interleaved track from per-channel buffers (shortest wins)
    pub fn from_channels(channels: &[Vec<f32>], sample_rate: u32) -> Self {
        let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
        let mut samples = Vec::with_capacity(frames * channels.len());
        for i in 0..frames {
            for ch in channels {
                samples.push(ch[i]);
            }
        }
        Self::new(channels.len() as u16, sample_rate, samples)
    }

    /// Samples per channel
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// De-interleaved copy of one channel
    pub fn channel(&self, index: usize) -> Vec<f32> {
        let channels = self.channels.max(1) as usize;
        self.samples
            .iter()
            .skip(index)
            .step_by(channels)
            .copied()
            .collect()
    }

    /// Peak absolute amplitude
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    /// Keep only the first `frames` frames
    pub fn truncate_frames(&mut self, frames: usize) {
        let len = frames * self.channels as usize;
        self.samples.truncate(len);
    }
}

// =============================================================================
// Supported formats
// =============================================================================

/// Audio formats recognized by ragam
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Flac,
    Aiff,
    Ogg,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "wav" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            "aiff" | "aif" => Some(AudioFormat::Aiff),
            "ogg" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Formats the external separator can only read through FFmpeg
    pub fn needs_ffmpeg(self) -> bool {
        !matches!(self, AudioFormat::Wav | AudioFormat::Flac)
    }
}
