//! Cache-aware separation
//!
//! `separate(input, model)` hashes the input, answers from the cache when the
//! entry is complete, and otherwise runs the model into a staging directory,
//! flattens whatever layout the model produced into `{stem}.wav`, and promotes
//! the staging directory by rename. At most one run per key happens at a time.

use crate::analysis::traits::{SeparationModel, SeparationRequest};
use crate::audio::{self, TrackWriter};
use crate::cache::{CacheKey, ClaimFile, ClaimPolicy, ContentDigest, ContentHasher, KeyedLocks, SeparationCache};
use crate::error::{RagamError, Result};
use crate::types::{StemKind, StemSet};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Subdirectory of the staging area handed to the model
const MODEL_SCRATCH_DIR: &str = "model_out";

/// Result of one `separate` call
#[derive(Debug, Clone)]
pub struct SeparationOutcome {
    pub stems: StemSet,
    pub digest: ContentDigest,
    /// True when no model ran
    pub cache_hit: bool,
    pub elapsed: Duration,
}

/// Populates and serves the stem cache
pub struct SeparationOrchestrator {
    cache: SeparationCache,
    hasher: ContentHasher,
    model: Box<dyn SeparationModel>,
    writer: Arc<dyn TrackWriter>,
    locks: Arc<KeyedLocks>,
    claim_policy: ClaimPolicy,
}

impl SeparationOrchestrator {
    pub fn new(cache: SeparationCache, model: Box<dyn SeparationModel>, writer: Arc<dyn TrackWriter>) -> Self {
        Self {
            cache,
            hasher: ContentHasher::new(),
            model,
            writer,
            locks: Arc::new(KeyedLocks::new()),
            claim_policy: ClaimPolicy::default(),
        }
    }

    /// Share an in-process lock registry with other orchestrators
    pub fn with_locks(mut self, locks: Arc<KeyedLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_claim_policy(mut self, policy: ClaimPolicy) -> Self {
        self.claim_policy = policy;
        self
    }

    pub fn claim_policy(&self) -> ClaimPolicy {
        self.claim_policy
    }

    pub fn cache(&self) -> &SeparationCache {
        &self.cache
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    /// Stems for `input` under `model_id`, from cache or a fresh model run
    pub fn separate(&self, input: &Path, model_id: &str) -> Result<SeparationOutcome> {
        let started = Instant::now();
        let digest = self.hasher.hash(input)?;
        let key = CacheKey::new(input, digest, model_id);

        if let Some(stems) = self.cache.lookup(&key) {
            info!("Cache hit for {} ({})", input.display(), key.entry_name);
            return Ok(SeparationOutcome {
                stems,
                digest,
                cache_hit: true,
                elapsed: started.elapsed(),
            });
        }

        let _guard = self.locks.lock(&self.cache.entry_dir(&key));

        std::fs::create_dir_all(self.cache.model_dir(&key))
            .map_err(|e| RagamError::output_error(self.cache.model_dir(&key), e).into_separation_failure(input))?;
        let _claim = ClaimFile::acquire(&self.cache.claim_path(&key), self.claim_policy)
            .map_err(|e| e.into_separation_failure(input))?;

        // Another thread or process may have finished while we waited
        if let Some(stems) = self.cache.lookup(&key) {
            info!("Cache filled while waiting for {} ({})", input.display(), key.entry_name);
            return Ok(SeparationOutcome {
                stems,
                digest,
                cache_hit: true,
                elapsed: started.elapsed(),
            });
        }

        info!("Cache miss for {}, running {}", input.display(), self.model.name());
        let stems = self
            .populate(input, &key)
            .map_err(|e| e.into_separation_failure(input))?;

        Ok(SeparationOutcome {
            stems,
            digest,
            cache_hit: false,
            elapsed: started.elapsed(),
        })
    }

    fn populate(&self, input: &Path, key: &CacheKey) -> Result<StemSet> {
        if !self.model.is_available() {
            return Err(RagamError::separation_failed(
                input,
                format!("separation backend '{}' is not available", self.model.name()),
            ));
        }

        // Dropped at the end of this call; removes leftovers on every path
        let staging = self.cache.create_staging(key)?;
        let scratch = staging.path().join(MODEL_SCRATCH_DIR);
        std::fs::create_dir_all(&scratch).map_err(|e| RagamError::output_error(&scratch, e))?;

        let request = SeparationRequest {
            input: input.to_path_buf(),
            model_id: key.model_id.clone(),
            output_root: scratch.clone(),
        };
        self.model.separate(&request, self.writer.as_ref())?;

        normalize_layout(&scratch, staging.path(), self.writer.as_ref())?;
        std::fs::remove_dir_all(&scratch).map_err(|e| RagamError::output_error(&scratch, e))?;

        self.cache.promote(key, staging.path())
    }
}

/// Flatten model output under `scratch` into `<dest>/{stem}.wav`
///
/// Files are matched by their stem name anywhere in the tree. WAV files are
/// moved as-is; other formats are decoded and re-written through `writer`.
pub fn normalize_layout(scratch: &Path, dest: &Path, writer: &dyn TrackWriter) -> Result<()> {
    let mut found: HashMap<StemKind, PathBuf> = HashMap::new();

    for entry in WalkDir::new(scratch).sort_by_file_name().into_iter() {
        let entry = entry.map_err(|e| RagamError::separation_failed(scratch, format!("Cannot scan model output: {}", e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(kind) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<StemKind>().ok())
        else {
            continue;
        };

        // Prefer a WAV when a model emits several encodings of one stem
        let is_wav = has_wav_extension(path);
        match found.get(&kind) {
            Some(existing) if has_wav_extension(existing) || !is_wav => {}
            _ => {
                found.insert(kind, path.to_path_buf());
            }
        }
    }

    let missing: Vec<&str> = StemKind::ALL
        .iter()
        .filter(|k| !found.contains_key(k))
        .map(|k| k.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(RagamError::separation_failed(
            scratch,
            format!("model produced no output for: {}", missing.join(", ")),
        ));
    }

    for kind in StemKind::ALL {
        let Some(source) = found.get(&kind) else {
            continue;
        };
        let target = dest.join(kind.file_name());
        if has_wav_extension(source) {
            debug!("Moving {} -> {}", source.display(), target.display());
            std::fs::rename(source, &target).map_err(|e| RagamError::output_error(&target, e))?;
        } else {
            debug!("Transcoding {} -> {}", source.display(), target.display());
            let track = audio::decode_track(source)?;
            writer.write(&target, &track)?;
        }
    }

    Ok(())
}

fn has_wav_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}
