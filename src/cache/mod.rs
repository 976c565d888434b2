//! Content-addressed separation cache

pub mod hasher;
pub mod lock;
pub mod store;

pub use hasher::{ContentDigest, ContentHasher};
pub use lock::{ClaimFile, ClaimPolicy, KeyGuard, KeyedLocks, DEFAULT_STALE_CLAIM_SECS};
pub use store::{sanitize_name, CacheKey, SeparationCache};
