//! Content fingerprinting for cache keys
//!
//! MD5 over the full byte stream, read in fixed-size chunks. This is a cache
//! key, not a security boundary.

use crate::error::{RagamError, Result};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::trace;

/// Read size used while folding a file into the digest
pub const CHUNK_SIZE: usize = 4096;

/// Number of hex characters of the digest used in cache directory names
pub const SHORT_HEX_LEN: usize = 8;

/// 128-bit content digest
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 16]);

impl ContentDigest {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Full lowercase hex (32 chars)
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Leading hex characters used in cache entry names
    pub fn short_hex(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHORT_HEX_LEN);
        hex
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

/// Streams files into an MD5 digest
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    pub fn new() -> Self {
        Self
    }

    /// Digest of the file's bytes; metadata and name play no part
    pub fn hash(&self, path: &Path) -> Result<ContentDigest> {
        let file = File::open(path).map_err(|e| RagamError::HashingFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let digest = self
            .hash_reader(BufReader::new(file))
            .map_err(|e| RagamError::HashingFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        trace!("Hashed {} -> {}", path.display(), digest);
        Ok(digest)
    }

    /// Digest of any byte stream
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> std::io::Result<ContentDigest> {
        let mut context = md5::Context::new();
        let mut buf = [0u8; CHUNK_SIZE];

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            context.consume(&buf[..n]);
        }

        Ok(ContentDigest(context.compute().0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_known_digest() {
        let digest = ContentHasher::new().hash_reader(Cursor::new(b"")).unwrap();
        assert_eq!(digest.to_hex(), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(digest.short_hex(), "d41d8cd9");
    }

    #[test]
    fn test_chunk_boundaries_do_not_matter() {
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let streamed = ContentHasher::new().hash_reader(Cursor::new(&data)).unwrap();
        let whole = ContentDigest::from_bytes(md5::compute(&data).0);
        assert_eq!(streamed, whole);
    }

    #[test]
    fn test_same_bytes_different_names() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("first name.wav");
        let b = dir.path().join("other.mp3");
        std::fs::write(&a, b"identical payload").unwrap();
        std::fs::write(&b, b"identical payload").unwrap();

        let hasher = ContentHasher::new();
        assert_eq!(hasher.hash(&a).unwrap(), hasher.hash(&b).unwrap());
    }

    #[test]
    fn test_missing_file_is_hashing_failed() {
        let err = ContentHasher::new().hash(Path::new("/definitely/not/here.wav")).unwrap_err();
        assert!(matches!(err, RagamError::HashingFailed { .. }));
    }
}
