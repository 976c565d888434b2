//! Integration tests for the ragam pipeline
//!
//! External models are replaced by in-process fakes implementing the same
//! traits; all audio is synthesized with hound into temp directories.

use ragam::analysis::traits::SeparationRequest;
use ragam::analysis::{SeparationModel, TonalAnalyzer};
use ragam::audio::{TrackWriter, WavTrackWriter};
use ragam::cache::{CacheKey, ClaimPolicy, ContentHasher, KeyedLocks, SeparationCache};
use ragam::config::Settings;
use ragam::mixer::StemMixer;
use ragam::pipeline::{AnalysisRequest, Pipeline};
use ragam::separation::SeparationOrchestrator;
use ragam::transcription::{BasicPitchCommand, PyinTranscriber, TranscriptionChain, TranscriptionStrategy};
use ragam::{RagamError, StemKind, Track, TrackRef};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const MODEL: &str = "mdx_extra_q";

/// Generate a sine wave WAV file for testing
///
/// Creates a mono 16-bit WAV file at the specified path.
fn generate_sine_wav(path: &Path, frequency_hz: f32, duration_secs: f32, sample_rate: u32) {
    generate_melody_wav(path, &[(frequency_hz, duration_secs)], 0.5, sample_rate);
}

/// Concatenated sine segments; a frequency of 0 writes silence
///
/// Phase carries across segments so note changes do not click.
fn generate_melody_wav(path: &Path, notes: &[(f32, f32)], amplitude: f32, sample_rate: u32) {
    use std::f64::consts::PI;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV file");

    let mut phase = 0.0f64;
    for &(frequency_hz, duration_secs) in notes {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        let step = 2.0 * PI * frequency_hz as f64 / sample_rate as f64;
        for _ in 0..num_samples {
            let sample = if frequency_hz > 0.0 {
                phase.sin() as f32 * amplitude
            } else {
                0.0
            };
            phase = (phase + step) % (2.0 * PI);
            writer
                .write_sample((sample * 32767.0) as i16)
                .expect("Failed to write sample");
        }
    }

    writer.finalize().expect("Failed to finalize WAV");
}

fn read_i16(path: &Path) -> Vec<i16> {
    hound::WavReader::open(path)
        .expect("Failed to open WAV")
        .into_samples::<i16>()
        .map(|s| s.expect("Failed to read sample"))
        .collect()
}

/// Writes four short stems in a demucs-like nested layout and counts calls
struct FakeSeparator {
    calls: Arc<AtomicUsize>,
    delay: Duration,
    fail: bool,
}

impl FakeSeparator {
    fn new(calls: Arc<AtomicUsize>) -> Self {
        Self {
            calls,
            delay: Duration::ZERO,
            fail: false,
        }
    }

    fn stem_track(kind: StemKind) -> Track {
        use std::f32::consts::PI;
        let freq = match kind {
            StemKind::Vocals => 440.0,
            StemKind::Drums => 110.0,
            StemKind::Bass => 55.0,
            StemKind::Other => 330.0,
        };
        let sr = 22050;
        let samples = (0..sr).map(|i| 0.4 * (2.0 * PI * freq * i as f32 / sr as f32).sin()).collect();
        Track::new(1, sr, samples)
    }
}

impl SeparationModel for FakeSeparator {
    fn separate(&self, request: &SeparationRequest, writer: &dyn TrackWriter) -> ragam::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        if self.fail {
            return Err(RagamError::separation_failed(&request.input, "model exploded"));
        }

        let stem = request.input.file_stem().unwrap_or_default();
        let out_dir = request.output_root.join(&request.model_id).join(stem);
        fs::create_dir_all(&out_dir)?;
        for kind in StemKind::ALL {
            writer.write(&out_dir.join(kind.file_name()), &Self::stem_track(kind))?;
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "fake-separator"
    }
}

fn orchestrator(root: &Path, model: FakeSeparator) -> SeparationOrchestrator {
    SeparationOrchestrator::new(SeparationCache::new(root), Box::new(model), Arc::new(WavTrackWriter::new()))
}

/// Pipeline whose separator is a fake and whose primary transcriber is missing
fn test_pipeline(root: &Path, calls: Arc<AtomicUsize>) -> Pipeline {
    let settings = Settings {
        outputs_root: root.to_path_buf(),
        show_progress: false,
        ..Settings::default()
    };
    let missing_tool = root.join("no-basic-pitch");
    let transcriber = TranscriptionChain::probe(
        Box::new(BasicPitchCommand::probe(Some(missing_tool.as_path()))),
        Box::new(PyinTranscriber::default()),
    );
    Pipeline::with_components(
        settings,
        orchestrator(root, FakeSeparator::new(calls)),
        transcriber,
        TonalAnalyzer::default(),
        StemMixer::new(Arc::new(WavTrackWriter::new())),
    )
}

// =============================================================================
// Hashing
// =============================================================================

#[test]
fn test_hashing_same_file_twice_is_stable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tone.wav");
    generate_sine_wav(&path, 440.0, 0.5, 22050);

    let hasher = ContentHasher::new();
    assert_eq!(hasher.hash(&path).unwrap(), hasher.hash(&path).unwrap());
}

#[test]
fn test_one_byte_difference_changes_cache_key() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.wav");
    generate_sine_wav(&a, 440.0, 0.5, 22050);
    let mut bytes = fs::read(&a).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    let b = dir.path().join("b.wav");
    fs::write(&b, &bytes).unwrap();

    let hasher = ContentHasher::new();
    let (da, db) = (hasher.hash(&a).unwrap(), hasher.hash(&b).unwrap());
    assert_ne!(da, db);

    let cache = SeparationCache::new(dir.path());
    let same_name = Path::new("song.wav");
    assert_ne!(
        cache.entry_dir(&CacheKey::new(same_name, da, MODEL)),
        cache.entry_dir(&CacheKey::new(same_name, db, MODEL))
    );
}

#[test]
fn test_hash_missing_file_fails() {
    let err = ContentHasher::new().hash(Path::new("/nonexistent/song.wav")).unwrap_err();
    assert!(matches!(err, RagamError::HashingFailed { .. }));
}

// =============================================================================
// Separation cache
// =============================================================================

#[test]
fn test_second_request_is_cache_hit() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("Kriti Demo.wav");
    generate_sine_wav(&input, 220.0, 0.5, 22050);
    let calls = Arc::new(AtomicUsize::new(0));
    let orch = orchestrator(&dir.path().join("out"), FakeSeparator::new(calls.clone()));

    let first = orch.separate(&input, MODEL).unwrap();
    assert!(!first.cache_hit);
    assert!(first.stems.is_complete());
    let expected = dir
        .path()
        .join("out")
        .join(MODEL)
        .join(format!("Kriti_Demo_{}", first.digest.short_hex()));
    assert_eq!(first.stems.dir, expected);

    let second = orch.separate(&input, MODEL).unwrap();
    assert!(second.cache_hit);
    assert_eq!(second.stems, first.stems);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Same bytes under another name
    let renamed = dir.path().join("renamed.wav");
    fs::copy(&input, &renamed).unwrap();
    let third = orch.separate(&renamed, MODEL).unwrap();
    assert!(third.cache_hit);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // No claim or staging leftovers next to the entry
    let leftovers: Vec<_> = fs::read_dir(dir.path().join("out").join(MODEL))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_model_id_scopes_entries() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("song.wav");
    generate_sine_wav(&input, 220.0, 0.5, 22050);
    let calls = Arc::new(AtomicUsize::new(0));
    let orch = orchestrator(&dir.path().join("out"), FakeSeparator::new(calls.clone()));

    orch.separate(&input, "mdx_extra_q").unwrap();
    orch.separate(&input, "htdemucs").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_concurrent_requests_run_model_once() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("song.wav");
    generate_sine_wav(&input, 220.0, 0.5, 22050);
    let calls = Arc::new(AtomicUsize::new(0));
    let model = FakeSeparator {
        delay: Duration::from_millis(200),
        ..FakeSeparator::new(calls.clone())
    };
    let orch = orchestrator(&dir.path().join("out"), model);

    let outcomes: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| orch.separate(&input, MODEL))).collect();
        handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcomes.iter().filter(|o| !o.cache_hit).count(), 1);
    assert!(outcomes.iter().all(|o| o.stems == outcomes[0].stems));
}

#[test]
fn test_independent_orchestrators_coordinate_through_claim_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("song.wav");
    generate_sine_wav(&input, 220.0, 0.5, 22050);
    let out = dir.path().join("out");
    let calls = Arc::new(AtomicUsize::new(0));
    let policy = ClaimPolicy {
        stale_after: Duration::from_secs(3600),
        poll_interval: Duration::from_millis(20),
    };

    // Separate lock registries stand in for separate processes
    let make = || {
        let model = FakeSeparator {
            delay: Duration::from_millis(200),
            ..FakeSeparator::new(calls.clone())
        };
        orchestrator(&out, model)
            .with_locks(Arc::new(KeyedLocks::new()))
            .with_claim_policy(policy)
    };
    let (a, b) = (make(), make());

    std::thread::scope(|s| {
        let ha = s.spawn(|| a.separate(&input, MODEL));
        let hb = s.spawn(|| b.separate(&input, MODEL));
        ha.join().unwrap().unwrap();
        hb.join().unwrap().unwrap();
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// Claim left behind by a run that was killed mid-separation
#[cfg(unix)]
#[test]
fn test_claim_from_killed_run_does_not_block() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("song.wav");
    generate_sine_wav(&input, 220.0, 0.5, 22050);
    let out = dir.path().join("out");
    let calls = Arc::new(AtomicUsize::new(0));

    let cache = SeparationCache::new(&out);
    let key = CacheKey::new(&input, ContentHasher::new().hash(&input).unwrap(), MODEL);
    fs::create_dir_all(cache.model_dir(&key)).unwrap();
    // Above any kernel pid_max, so no such process exists
    fs::write(cache.claim_path(&key), "99999999\n").unwrap();

    let orch = orchestrator(&out, FakeSeparator::new(calls.clone()));
    let (tx, rx) = std::sync::mpsc::channel();
    let worker = std::thread::spawn(move || {
        let _ = tx.send(orch.separate(&input, MODEL));
    });

    let outcome = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("Separation stayed blocked on the orphaned claim")
        .unwrap();
    worker.join().unwrap();

    assert!(!outcome.cache_hit);
    assert!(outcome.stems.is_complete());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!cache.claim_path(&key).exists());
}

#[test]
fn test_partial_entry_is_reprocessed() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("song.wav");
    generate_sine_wav(&input, 220.0, 0.5, 22050);
    let out = dir.path().join("out");
    let calls = Arc::new(AtomicUsize::new(0));
    let orch = orchestrator(&out, FakeSeparator::new(calls.clone()));

    let digest = ContentHasher::new().hash(&input).unwrap();
    let entry = SeparationCache::new(&out).entry_dir(&CacheKey::new(&input, digest, MODEL));
    fs::create_dir_all(&entry).unwrap();
    fs::write(entry.join("vocals.wav"), b"truncated").unwrap();

    let outcome = orch.separate(&input, MODEL).unwrap();
    assert!(!outcome.cache_hit);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.stems.dir, entry);
    assert!(outcome.stems.is_complete());
    assert!(hound::WavReader::open(&outcome.stems.vocals).is_ok());
}

#[test]
fn test_model_failure_leaves_cache_untouched() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("song.wav");
    generate_sine_wav(&input, 220.0, 0.5, 22050);
    let out = dir.path().join("out");
    let calls = Arc::new(AtomicUsize::new(0));
    let model = FakeSeparator {
        fail: true,
        ..FakeSeparator::new(calls.clone())
    };

    let err = orchestrator(&out, model).separate(&input, MODEL).unwrap_err();
    assert!(matches!(err, RagamError::SeparationFailed { .. }));
    assert!(err.to_string().contains("model exploded"));

    let remaining: Vec<_> = fs::read_dir(out.join(MODEL)).unwrap().collect();
    assert!(remaining.is_empty(), "no entry, staging dir or claim may survive");
}

// =============================================================================
// Mixing
// =============================================================================

#[test]
fn test_mixing_identical_full_scale_tracks_halves_the_sum() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.wav");
    let b = dir.path().join("b.wav");
    generate_melody_wav(&a, &[(100.0, 0.2)], 1.0, 8000);
    fs::copy(&a, &b).unwrap();

    let dest = StemMixer::destination_in(dir.path());
    let outcome = StemMixer::new(Arc::new(WavTrackWriter::new()))
        .mix(&[a.clone(), b], &dest)
        .unwrap();
    assert_eq!(outcome.output.as_deref(), Some(dest.as_path()));
    assert_eq!(outcome.mixed, 2);

    let input = read_i16(&a);
    let mixed = read_i16(&dest);
    assert_eq!(mixed.len(), input.len());
    for (m, i) in mixed.iter().zip(&input) {
        assert!((*m as i32 - *i as i32).abs() <= 2, "{} vs {}", m, i);
    }
    assert!(mixed.iter().any(|s| *s >= 32760));
}

#[test]
fn test_mix_skips_unreadable_and_truncates() {
    let dir = TempDir::new().unwrap();
    let long = dir.path().join("long.wav");
    let short = dir.path().join("short.wav");
    let broken = dir.path().join("broken.wav");
    generate_melody_wav(&long, &[(200.0, 1.0)], 0.3, 8000);
    generate_melody_wav(&short, &[(300.0, 0.5)], 0.3, 8000);
    fs::write(&broken, b"not audio").unwrap();

    let dest = StemMixer::destination_in(dir.path());
    let outcome = StemMixer::new(Arc::new(WavTrackWriter::new()))
        .mix(&[broken.clone(), long, short], &dest)
        .unwrap();

    assert_eq!(outcome.mixed, 2);
    assert_eq!(outcome.skipped.len(), 1);
    assert!(matches!(&outcome.skipped[0], RagamError::MixSkipped { path, .. } if *path == broken));
    assert_eq!(read_i16(&dest).len(), 4000);
}

#[test]
fn test_mix_resamples_to_first_track_rate() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.wav");
    let b = dir.path().join("b.wav");
    generate_melody_wav(&a, &[(200.0, 1.0)], 0.3, 22050);
    generate_melody_wav(&b, &[(200.0, 1.0)], 0.3, 44100);

    let dest = StemMixer::destination_in(dir.path());
    StemMixer::new(Arc::new(WavTrackWriter::new()))
        .mix(&[a, b], &dest)
        .unwrap();

    let reader = hound::WavReader::open(&dest).unwrap();
    assert_eq!(reader.spec().sample_rate, 22050);
    let frames = reader.len() as i64;
    assert!((frames - 22050).abs() < 600, "got {} frames", frames);
}

#[test]
fn test_mix_with_no_readable_tracks_has_no_output() {
    let dir = TempDir::new().unwrap();
    let dest = StemMixer::destination_in(dir.path());
    let outcome = StemMixer::new(Arc::new(WavTrackWriter::new()))
        .mix(&[dir.path().join("missing.wav")], &dest)
        .unwrap();
    assert!(outcome.output.is_none());
    assert!(!dest.exists());
}

#[test]
fn test_pipeline_mix_writes_custom_mix() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("song.wav");
    generate_sine_wav(&input, 220.0, 0.5, 22050);
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = test_pipeline(dir.path(), calls.clone());

    let report = pipeline.mix(&input, &[StemKind::Vocals, StemKind::Bass]).unwrap();
    let expected = dir.path().join("mixes").join("custom_mix.wav");
    assert_eq!(report.outcome.output.as_deref(), Some(expected.as_path()));
    assert!(report.outcome.skipped.is_empty());

    // Overwritten in place, separation served from cache
    pipeline.mix(&input, &[StemKind::Drums]).unwrap();
    assert!(expected.exists());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Analysis
// =============================================================================

#[test]
fn test_analyze_major_scale_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("scale.wav");
    // C4 held longest so it dominates the chroma
    let scale = [261.63, 293.66, 329.63, 349.23, 392.00, 440.00, 493.88];
    let mut notes = vec![(scale[0], 1.0)];
    notes.extend(scale[1..].iter().map(|&f| (f, 0.5)));
    generate_melody_wav(&input, &notes, 0.5, 22050);

    let pipeline = test_pipeline(dir.path(), Arc::new(AtomicUsize::new(0)));
    let report = pipeline
        .analyze(&AnalysisRequest {
            input: input.clone(),
            track: TrackRef::Original,
        })
        .unwrap();

    assert_eq!(report.tonic, ragam::PitchClass::C);
    assert_eq!(report.raga.captured, vec![0, 2, 4, 5, 7, 9, 11]);
    assert_eq!(report.raga.overlap, 7);
    assert_eq!(report.raga.raga.name, "Dheerasankarabharanam");

    assert_eq!(report.transcription.produced_by, TranscriptionStrategy::Fallback);
    let pitches: Vec<u8> = report.transcription.events.iter().map(|e| e.pitch).collect();
    assert_eq!(pitches, vec![60, 62, 64, 65, 67, 69, 71]);
    assert_eq!(report.swara_sequence(), "S R2 G3 M1 P D2 N3");
    assert_eq!(report.notes[0].western, "C4");
    assert!(!report.chords.labels.is_empty());
    assert_eq!(report.chords.labels.len(), report.chords.times.len());

    let json_path = dir.path().join("report.json");
    ragam::export::write_report(&report, &json_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value["analysis"]["raga"]["number"], 29);
    assert_eq!(value["analysis"]["transcription"]["strategy"], "fallback");
}

#[test]
fn test_analyze_stem_resolves_through_cache() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("song.wav");
    generate_sine_wav(&input, 220.0, 0.5, 22050);
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = test_pipeline(dir.path(), calls.clone());

    let request = AnalysisRequest {
        input: input.clone(),
        track: TrackRef::Stem(StemKind::Vocals),
    };
    let report = pipeline.analyze(&request).unwrap();

    // The fake vocals stem is a steady A4
    assert_eq!(report.tonic, ragam::PitchClass::A);
    assert!(report.analyzed_path.ends_with("vocals.wav"));
    assert!(!report.notes.is_empty());
    assert!(report.notes.iter().all(|n| n.midi == 69 && n.swara == "S"));

    pipeline.analyze(&request).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_analyze_silence_has_no_notes() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("silence.wav");
    generate_melody_wav(&input, &[(0.0, 1.0)], 0.0, 22050);

    let report = test_pipeline(dir.path(), Arc::new(AtomicUsize::new(0)))
        .analyze(&AnalysisRequest {
            input,
            track: TrackRef::Original,
        })
        .unwrap();
    assert!(report.transcription.events.is_empty());
    assert_eq!(report.swara_line(), "");
    assert!(report.chords.labels.iter().all(|l| l.to_string() == "N/A"));
}

#[test]
fn test_analyze_invalid_audio_is_analysis_failure() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("broken.wav");
    fs::write(&input, b"RIFF but not really").unwrap();

    let err = test_pipeline(dir.path(), Arc::new(AtomicUsize::new(0)))
        .analyze(&AnalysisRequest {
            input,
            track: TrackRef::Original,
        })
        .unwrap_err();
    assert!(matches!(err, RagamError::AnalysisFailed { .. }));
}
