//! Content-addressed stem cache
//!
//! Layout (stable, other tooling relies on it):
//!
//! ```text
//! <outputs>/<modelId>/<sanitized base name>_<8 hex digest>/{vocals,drums,bass,other}.wav
//! ```
//!
//! An entry counts as a hit only when all four files exist. Entries are
//! populated through a staging directory that is renamed into place once
//! complete, so readers never observe a half-written entry.

use super::hasher::ContentDigest;
use crate::error::{RagamError, Result};
use crate::types::StemSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Identifies one cache entry: `(digest, model)` plus the display-friendly base name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub model_id: String,
    pub entry_name: String,
    pub digest: ContentDigest,
}

impl CacheKey {
    pub fn new(input: &Path, digest: ContentDigest, model_id: &str) -> Self {
        let base = input.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        Self {
            model_id: sanitize_name(model_id),
            entry_name: format!("{}_{}", sanitize_name(base), digest.short_hex()),
            digest,
        }
    }
}

/// Replace whitespace and path-hostile characters with `_`
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_whitespace() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                '_'
            } else {
                c
            }
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "track".to_string(),
        _ => cleaned,
    }
}

/// The on-disk stem cache rooted at the outputs directory
#[derive(Debug, Clone)]
pub struct SeparationCache {
    root: PathBuf,
}

impl SeparationCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every entry for one model
    pub fn model_dir(&self, key: &CacheKey) -> PathBuf {
        self.root.join(&key.model_id)
    }

    /// Canonical entry directory
    pub fn entry_dir(&self, key: &CacheKey) -> PathBuf {
        self.model_dir(key).join(&key.entry_name)
    }

    /// Claim file guarding an entry while it is being produced
    pub fn claim_path(&self, key: &CacheKey) -> PathBuf {
        self.model_dir(key).join(format!(".{}.claim", key.entry_name))
    }

    /// Complete entry, if present. Only existence checks and a directory listing.
    ///
    /// The same content uploaded under another name is found through any
    /// complete sibling entry carrying the same digest suffix.
    pub fn lookup(&self, key: &CacheKey) -> Option<StemSet> {
        let stems = StemSet::in_dir(&self.entry_dir(key));
        if stems.is_complete() {
            return Some(stems);
        }
        self.lookup_by_digest(key)
    }

    fn lookup_by_digest(&self, key: &CacheKey) -> Option<StemSet> {
        let suffix = format!("_{}", key.digest.short_hex());
        let mut candidates: Vec<PathBuf> = std::fs::read_dir(self.model_dir(key))
            .ok()?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                !name.starts_with('.') && name.ends_with(&suffix)
            })
            .map(|entry| entry.path())
            .collect();
        candidates.sort();

        let found = candidates
            .into_iter()
            .map(|dir| StemSet::in_dir(&dir))
            .find(StemSet::is_complete)?;
        debug!("Digest {} already cached as {}", key.digest.short_hex(), found.dir.display());
        Some(found)
    }

    /// Fresh staging directory next to the entry (same filesystem, so promotion is a rename)
    pub fn create_staging(&self, key: &CacheKey) -> Result<TempDir> {
        let model_dir = self.model_dir(key);
        std::fs::create_dir_all(&model_dir).map_err(|e| RagamError::output_error(&model_dir, e))?;

        tempfile::Builder::new()
            .prefix(&format!(".staging-{}-", key.entry_name))
            .tempdir_in(&model_dir)
            .map_err(|e| RagamError::output_error(&model_dir, e))
    }

    /// Move a fully populated staging directory into its canonical place
    ///
    /// If a complete entry already exists it wins and the staged copy is left
    /// for the caller to discard. An incomplete canonical directory is never
    /// trusted and gets replaced.
    pub fn promote(&self, key: &CacheKey, staged: &Path) -> Result<StemSet> {
        let staged_set = StemSet::in_dir(staged);
        let missing: Vec<&str> = staged_set
            .iter()
            .filter(|(_, p)| !p.is_file())
            .map(|(k, _)| k.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(RagamError::separation_failed(
                staged,
                format!("staged output is missing stems: {}", missing.join(", ")),
            ));
        }

        if let Some(existing) = self.lookup(key) {
            debug!("Entry {} completed concurrently, keeping existing", key.entry_name);
            return Ok(existing);
        }

        let canonical = self.entry_dir(key);
        if canonical.exists() {
            warn!("Replacing incomplete cache entry {}", canonical.display());
            std::fs::remove_dir_all(&canonical).map_err(|e| RagamError::output_error(&canonical, e))?;
        }

        std::fs::rename(staged, &canonical).map_err(|e| RagamError::OutputError {
            path: canonical.clone(),
            reason: format!("Failed to promote staged stems: {}", e),
        })?;

        info!("Cached stems at {}", canonical.display());
        Ok(StemSet::in_dir(&canonical))
    }
}
