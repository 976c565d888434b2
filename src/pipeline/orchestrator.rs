//! Pipeline orchestration
//!
//! A [`Pipeline`] is built once from [`Settings`]: external tools are probed
//! here and never again. Each request then flows through explicit request and
//! response values; nothing but the on-disk cache outlives a call.

use crate::analysis::chords::ChordTimeline;
use crate::analysis::swara::{format_swara_sequence, note_table, NoteRow};
use crate::analysis::{RagaMatch, SeparationModel, TonalAnalyzer};
use crate::audio::{TrackWriter, WavTrackWriter};
use crate::cache::{ClaimPolicy, ContentDigest, ContentHasher, SeparationCache};
use crate::config::Settings;
use crate::error::{RagamError, Result};
use crate::mixer::{MixOutcome, StemMixer};
use crate::separation::{DemucsCommand, SeparationOrchestrator, SeparationOutcome};
use crate::transcription::{Transcription, TranscriptionChain};
use crate::types::{ChordLabel, PitchClass, StemKind, TrackRef};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// One analysis request
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub input: PathBuf,
    pub track: TrackRef,
}

/// Everything `analyze` found for one track
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub input: PathBuf,
    pub track: TrackRef,
    /// File that was actually decoded
    pub analyzed_path: PathBuf,
    pub tonic: PitchClass,
    pub raga: RagaMatch,
    pub chords: ChordTimeline,
    pub transcription: Transcription,
    pub notes: Vec<NoteRow>,
    pub display_limit: usize,
}

impl AnalysisReport {
    pub fn progression(&self) -> Vec<ChordLabel> {
        self.chords.progression()
    }

    /// Swaras for every transcribed note
    pub fn swara_sequence(&self) -> String {
        format_swara_sequence(&self.transcription.events, self.tonic)
    }

    /// Swaras for the first `display_limit` notes
    pub fn swara_line(&self) -> String {
        let shown = self.transcription.events.len().min(self.display_limit);
        format_swara_sequence(&self.transcription.events[..shown], self.tonic)
    }
}

/// Stems that went into a mix, plus the mix result
#[derive(Debug)]
pub struct MixReport {
    pub separation: SeparationOutcome,
    pub stems: Vec<StemKind>,
    pub outcome: MixOutcome,
}

/// Separation, mixing and analysis behind one value
pub struct Pipeline {
    settings: Settings,
    separator: SeparationOrchestrator,
    transcriber: TranscriptionChain,
    analyzer: TonalAnalyzer,
    mixer: StemMixer,
}

impl Pipeline {
    /// Probe the runtime once and wire up the default backends
    pub fn from_settings(settings: Settings) -> Self {
        let writer: Arc<dyn TrackWriter> = Arc::new(WavTrackWriter::new());
        let model = select_separation_model(&settings);
        info!("Separation backend: {}", model.name());

        let separator = SeparationOrchestrator::new(SeparationCache::new(&settings.outputs_root), model, writer.clone())
            .with_claim_policy(ClaimPolicy::default().with_stale_after(settings.claim_stale_after));
        let transcriber = TranscriptionChain::detect(settings.basic_pitch_bin.as_deref(), settings.transcription_seconds);
        let analyzer = TonalAnalyzer::default().with_windows(settings.analysis_seconds, settings.chord_seconds);

        Self {
            settings,
            separator,
            transcriber,
            analyzer,
            mixer: StemMixer::new(writer),
        }
    }

    /// Assemble from explicit parts
    pub fn with_components(
        settings: Settings,
        separator: SeparationOrchestrator,
        transcriber: TranscriptionChain,
        analyzer: TonalAnalyzer,
        mixer: StemMixer,
    ) -> Self {
        Self {
            settings,
            separator,
            transcriber,
            analyzer,
            mixer,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn hash(&self, input: &Path) -> Result<ContentDigest> {
        ContentHasher::new().hash(input)
    }

    pub fn separate(&self, input: &Path) -> Result<SeparationOutcome> {
        self.separator.separate(input, &self.settings.model_id)
    }

    /// Separate `input` and mix the chosen stems into `<outputs>/mixes/custom_mix.wav`
    pub fn mix(&self, input: &Path, stems: &[StemKind]) -> Result<MixReport> {
        if stems.is_empty() {
            return Err(RagamError::ConfigError("Select at least one stem to mix".to_string()));
        }
        let separation = self.separate(input)?;
        let paths: Vec<PathBuf> = stems.iter().map(|k| separation.stems.get(*k).to_path_buf()).collect();
        let destination = StemMixer::destination_in(&self.settings.outputs_root);
        let outcome = self.mixer.mix(&paths, &destination)?;

        Ok(MixReport {
            separation,
            stems: stems.to_vec(),
            outcome,
        })
    }

    /// File a track reference points at, separating first for stems
    pub fn resolve_track(&self, input: &Path, track: &TrackRef) -> Result<PathBuf> {
        match track {
            TrackRef::Original => Ok(input.to_path_buf()),
            TrackRef::Stem(kind) => Ok(self.separate(input)?.stems.get(*kind).to_path_buf()),
            TrackRef::Mix(path) if path.is_file() => Ok(path.clone()),
            TrackRef::Mix(path) => Err(RagamError::AnalysisFailed {
                path: path.clone(),
                reason: "mix file does not exist, run `ragam mix` first".to_string(),
            }),
        }
    }

    /// Tonic, raga, chords and transcription for the requested track
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let started = Instant::now();
        let path = self.resolve_track(&request.input, &request.track)?;
        debug!("Analyzing {} as {}", path.display(), request.track);

        let tonal = self.analyzer.analyze_file(&path)?;
        let transcription = self.transcriber.transcribe(&path)?;
        let notes = note_table(&transcription.events, tonal.tonic);

        info!(
            "Analysis of {} done in {:.2}s ({} notes via {})",
            path.display(),
            started.elapsed().as_secs_f64(),
            notes.len(),
            transcription.backend
        );

        Ok(AnalysisReport {
            input: request.input.clone(),
            track: request.track.clone(),
            analyzed_path: path,
            tonic: tonal.tonic,
            raga: tonal.raga,
            chords: tonal.chords,
            transcription,
            notes,
            display_limit: self.settings.display_limit,
        })
    }
}

/// In-process ONNX when built with `stems` and the model is present, else demucs
fn select_separation_model(settings: &Settings) -> Box<dyn SeparationModel> {
    #[cfg(feature = "stems")]
    {
        use crate::separation::onnx::{find_model_path, OnnxSeparator};
        if settings.model_id == "htdemucs" {
            if let Ok(model_path) = find_model_path(None) {
                let separator = OnnxSeparator::load(Some(&model_path));
                if separator.is_available() {
                    return Box::new(separator);
                }
            }
        }
    }
    Box::new(DemucsCommand::probe(settings.demucs_bin.as_deref()))
}
