//! In-process HTDemucs separation via ONNX Runtime
//!
//! Writes its stems through the injected [`TrackWriter`] into the same nested
//! layout the demucs command produces (`<root>/<model>/<input stem>/<stem>.wav`).

use super::chunking::{crossfade_weights, OverlapAdd, SegmentPlan};
use crate::analysis::traits::{SeparationModel, SeparationRequest};
use crate::audio::{self, TrackWriter};
use crate::cache::sanitize_name;
use crate::error::{RagamError, Result};
use crate::types::{StemKind, Track};
use directories::ProjectDirs;
use ndarray::Array3;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::Session;
use ort::value::Tensor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// HTDemucs works on 44.1 kHz stereo
pub const MODEL_SAMPLE_RATE: u32 = 44100;

/// Default model file name searched for in the standard locations
pub const MODEL_FILENAME: &str = "htdemucs.ort";

/// Environment variable pointing at a model file
pub const MODEL_PATH_ENV: &str = "RAGAM_MODEL_PATH";

/// Find the model file by checking common locations
///
/// Search order: explicit path, `RAGAM_MODEL_PATH`, the platform cache and
/// data directories, `./models`, then `~/ragam/models`.
pub fn find_model_path(explicit: Option<&Path>) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Some(path) = explicit {
        candidates.push(path.to_path_buf());
    }
    if let Ok(env_path) = std::env::var(MODEL_PATH_ENV) {
        candidates.push(PathBuf::from(env_path));
    }
    if let Some(dirs) = ProjectDirs::from("com", "ragam", "ragam") {
        candidates.push(dirs.cache_dir().join("models").join(MODEL_FILENAME));
        candidates.push(dirs.data_dir().join("models").join(MODEL_FILENAME));
    }
    candidates.push(PathBuf::from("./models").join(MODEL_FILENAME));
    if let Some(base) = directories::BaseDirs::new() {
        candidates.push(base.home_dir().join("ragam").join("models").join(MODEL_FILENAME));
    }

    if let Some(found) = candidates.iter().find(|p| p.is_file()) {
        return Ok(found.clone());
    }

    let checked = candidates
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");
    Err(RagamError::ConfigError(format!(
        "HTDemucs model not found.\n\nLocations checked:\n{}\n\n  Set {}=/path/to/{}",
        checked, MODEL_PATH_ENV, MODEL_FILENAME
    )))
}

/// HTDemucs through ONNX Runtime
pub struct OnnxSeparator {
    session: Option<Mutex<Session>>,
}

impl OnnxSeparator {
    /// Load the model; an unusable model yields an unavailable separator
    pub fn load(explicit: Option<&Path>) -> Self {
        match find_model_path(explicit).and_then(|p| Self::create_session(&p)) {
            Ok(session) => Self {
                session: Some(Mutex::new(session)),
            },
            Err(e) => {
                warn!("ONNX separator unavailable: {}", e);
                Self { session: None }
            }
        }
    }

    fn create_session(model_path: &Path) -> Result<Session> {
        let session = Session::builder()
            .map_err(|e| RagamError::ConfigError(format!("Failed to create ORT session builder: {}", e)))?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .map_err(|e| RagamError::ConfigError(format!("Failed to configure CPU provider: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| RagamError::ConfigError(format!("Failed to load model {}: {}", model_path.display(), e)))?;

        info!("Loaded separation model {}", model_path.display());
        Ok(session)
    }

    /// Decode to 44.1 kHz stereo as two channel buffers
    fn load_stereo(path: &Path) -> Result<[Vec<f32>; 2]> {
        let track = audio::resample_track(&audio::decode_track(path)?, MODEL_SAMPLE_RATE);
        let left = track.channel(0);
        let right = if track.channels >= 2 { track.channel(1) } else { left.clone() };
        Ok([left, right])
    }

    fn run(&self, input: &Path) -> Result<Vec<[Vec<f32>; 2]>> {
        let failed = |reason: String| RagamError::separation_failed(input, reason);

        let session = self
            .session
            .as_ref()
            .ok_or_else(|| failed("ONNX session not initialized".to_string()))?;
        let mut session = session
            .lock()
            .map_err(|_| failed("Failed to acquire session lock".to_string()))?;

        let [left, right] = Self::load_stereo(input)?;
        let total = left.len().min(right.len());
        let plan = SegmentPlan::htdemucs(MODEL_SAMPLE_RATE);
        let segments = plan.segments(total);

        let mut accumulators: Vec<[OverlapAdd; 2]> = (0..StemKind::ALL.len())
            .map(|_| [OverlapAdd::new(total), OverlapAdd::new(total)])
            .collect();

        info!("Separating {:.1}s in {} segments", total as f64 / MODEL_SAMPLE_RATE as f64, segments.len());

        for (i, &(start, end)) in segments.iter().enumerate() {
            debug!("Segment {}/{}", i + 1, segments.len());
            let len = end - start;
            // Pad to the full window; only the first `len` outputs are kept
            let width = len.max(plan.segment.min(total));
            let mut input_data = Array3::<f32>::zeros((1, 2, width));
            for (j, (&l, &r)) in left[start..end].iter().zip(&right[start..end]).enumerate() {
                input_data[[0, 0, j]] = l;
                input_data[[0, 1, j]] = r;
            }

            let tensor = Tensor::from_array(input_data).map_err(|e| failed(format!("Failed to create input tensor: {}", e)))?;
            let input_name = session
                .inputs
                .first()
                .map(|inp| inp.name.clone())
                .ok_or_else(|| failed("Model has no input tensors defined".to_string()))?;

            let outputs = session
                .run(ort::inputs![input_name.as_str() => tensor])
                .map_err(|e| failed(format!("Inference failed: {}", e)))?;
            let output = outputs
                .iter()
                .next()
                .map(|(_, v)| v)
                .ok_or_else(|| failed("No output tensor from model".to_string()))?;
            let (shape, data) = output
                .try_extract_tensor::<f32>()
                .map_err(|e| failed(format!("Failed to extract output tensor: {}", e)))?;

            // Expect [1, 4 stems, 2 channels, samples]
            let dims: Vec<i64> = shape.iter().copied().collect();
            if dims.len() != 4 || dims[0] != 1 || dims[1] != 4 || dims[2] != 2 || dims[3] < 0 {
                return Err(failed(format!("Unexpected output shape {:?}", dims)));
            }
            let samples = dims[3] as usize;
            if data.len() != 4 * 2 * samples {
                return Err(failed(format!("Output length {} does not match shape {:?}", data.len(), dims)));
            }

            let keep = len.min(samples);
            let weights = crossfade_weights(keep, plan.overlap, i > 0, i + 1 < segments.len());
            for (stem_idx, channels) in accumulators.iter_mut().enumerate() {
                for (ch, acc) in channels.iter_mut().enumerate() {
                    let offset = (stem_idx * 2 + ch) * samples;
                    acc.add(start, &data[offset..offset + keep], &weights);
                }
            }
        }

        Ok(accumulators
            .into_iter()
            .map(|[l, r]| [l.finish(), r.finish()])
            .collect())
    }
}

impl SeparationModel for OnnxSeparator {
    fn separate(&self, request: &SeparationRequest, writer: &dyn TrackWriter) -> Result<()> {
        let stems = self.run(&request.input)?;

        let base = request.input.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let out_dir = request.output_root.join(&request.model_id).join(sanitize_name(base));
        std::fs::create_dir_all(&out_dir).map_err(|e| RagamError::output_error(&out_dir, e))?;

        for (kind, channels) in StemKind::ALL.iter().zip(stems) {
            let track = Track::from_channels(&channels, MODEL_SAMPLE_RATE);
            writer.write(&out_dir.join(kind.file_name()), &track)?;
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.session.is_some()
    }

    fn name(&self) -> &'static str {
        "htdemucs-ort"
    }
}
