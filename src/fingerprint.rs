//! Content fingerprints for source documents.
//!
//! A [`Fingerprint`] is the SHA-256 digest of a document's raw bytes. It is
//! compared for equality only: two documents with the same fingerprint are
//! content-identical no matter where they live, and nothing ever sorts or
//! keys semantics off a fingerprint.
//!
//! Content-based rather than mtime-based so it survives `git checkout`
//! (which resets modification times) and fresh CI clones.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io;
use std::path::Path;
use thiserror::Error;

/// A source document's bytes could not be read.
///
/// Affects only the one document: the pass skips and reports it.
#[derive(Error, Debug)]
#[error("Cannot read source {source_uri}: {source}")]
pub struct FingerprintReadError {
    pub source_uri: String,
    #[source]
    pub source: io::Error,
}

/// Length of a fingerprint in bytes.
pub const FINGERPRINT_LEN: usize = 32;

/// SHA-256 digest of a document's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex string. Returns `None` on bad input.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; FINGERPRINT_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> String {
        self.to_hex()[..12].to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Fingerprint::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid fingerprint: {s:?}")))
    }
}

/// Fingerprint a byte slice. Deterministic, no side effects.
pub fn fingerprint(bytes: &[u8]) -> Fingerprint {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; FINGERPRINT_LEN];
    out.copy_from_slice(&digest);
    Fingerprint(out)
}

/// Read a file and fingerprint its contents.
///
/// Read failures surface as plain I/O errors; there is no such thing as a
/// fingerprint failure.
pub fn fingerprint_file(path: &Path) -> io::Result<Fingerprint> {
    let bytes = std::fs::read(path)?;
    Ok(fingerprint(&bytes))
}
