//! Per-key mutual exclusion for cache population
//!
//! Two layers: a keyed lock registry serializes threads in this process, and
//! a claim file created with `create_new` serializes processes sharing the
//! outputs directory. The claim records its owner's PID. A claim whose owner
//! is no longer running, or that is older than the stale threshold, belongs
//! to an interrupted run and is taken over.

use crate::error::{RagamError, Result};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Age after which a claim is taken over even if its owner looks alive
pub const DEFAULT_STALE_CLAIM_SECS: u64 = 2 * 60 * 60;

/// Registry of the cache entry paths currently held in this process
///
/// Only held keys are stored, so the registry does not grow with the number
/// of distinct entries ever requested.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    held: Mutex<HashSet<PathBuf>>,
    released: Condvar,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `key` is free, then hold it until the guard drops
    pub fn lock(&self, key: &Path) -> KeyGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        while held.contains(key) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        held.insert(key.to_path_buf());
        KeyGuard {
            locks: self,
            key: key.to_path_buf(),
        }
    }

    /// Number of keys currently held
    pub fn held_count(&self) -> usize {
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}

/// Holds one key of a [`KeyedLocks`] registry
#[derive(Debug)]
pub struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: PathBuf,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.locks.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        held.remove(&self.key);
        drop(held);
        self.locks.released.notify_all();
    }
}

/// How long to wait on and when to steal another process's claim
#[derive(Debug, Clone, Copy)]
pub struct ClaimPolicy {
    pub stale_after: Duration,
    pub poll_interval: Duration,
}

impl ClaimPolicy {
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }
}

impl Default for ClaimPolicy {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(DEFAULT_STALE_CLAIM_SECS),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// Exclusive on-disk claim; removed on drop
#[derive(Debug)]
pub struct ClaimFile {
    path: PathBuf,
}

impl ClaimFile {
    /// Block until the claim at `path` is ours
    pub fn acquire(path: &Path, policy: ClaimPolicy) -> Result<Self> {
        let mut announced = false;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    writeln!(file, "{}", std::process::id())
                        .and_then(|_| file.sync_all())
                        .map_err(|e| {
                            let _ = std::fs::remove_file(path);
                            RagamError::output_error(path, e)
                        })?;
                    debug!("Claimed {}", path.display());
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    let owner = claim_owner(path);
                    if let Some(reason) = stale_reason(path, owner, policy) {
                        // Only remove the claim we judged; a fresh one may have replaced it
                        if claim_owner(path) == owner {
                            warn!("Taking over claim {} ({})", path.display(), reason);
                            match std::fs::remove_file(path) {
                                Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                                    return Err(RagamError::output_error(path, e));
                                }
                                _ => {}
                            }
                        }
                        continue;
                    }
                    if !announced {
                        match owner {
                            Some(pid) => warn!("Waiting for {} held by process {}", path.display(), pid),
                            None => warn!("Waiting for {}", path.display()),
                        }
                        announced = true;
                    }
                    std::thread::sleep(policy.poll_interval);
                }
                Err(e) => {
                    return Err(RagamError::output_error(path, e));
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ClaimFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Why the claim at `path` may be taken over, if it may
fn stale_reason(path: &Path, owner: Option<u32>, policy: ClaimPolicy) -> Option<String> {
    if let Some(pid) = owner {
        if !process_alive(pid) {
            return Some(format!("owner process {} is gone", pid));
        }
    }
    match claim_age(path) {
        Some(age) if age > policy.stale_after => Some(format!("older than {}s", policy.stale_after.as_secs())),
        _ => None,
    }
}

/// PID recorded in the claim; `None` while the owner is still writing it
fn claim_owner(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path)
        .ok()?
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|&pid| pid > 0)
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    // Signal 0 checks for existence without delivering anything
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

fn claim_age(path: &Path) -> Option<Duration> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    SystemTime::now().duration_since(modified).ok()
}
