//! Stage artifacts on disk.
//!
//! Each stage leaves pretty-printed JSON in the temp directory for the next
//! one to pick up:
//!
//! ```text
//! .folio-temp/
//! ├── snapshot.json    # fetch  → resolve
//! └── routes.json      # resolve → generate
//! ```
//!
//! Fingerprints are SHA-256 over the compact JSON encoding of a value. Struct
//! fields serialize in declaration order and nothing in the snapshot or route
//! types is a hash map, so equal values always produce equal fingerprints.

use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const SNAPSHOT_FILE: &str = "snapshot.json";
pub const ROUTES_FILE: &str = "routes.json";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// SHA-256 of `value`'s JSON encoding, as 64 hex characters.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> String {
    // Serializing plain data types into a Vec cannot fail.
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    format!("{:x}", Sha256::digest(&bytes))
}

/// First 12 hex characters, for display.
pub fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ManifestError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| ManifestError::Json {
        path: path.display().to_string(),
        source,
    })?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| io_error(path, source))?;
    }
    fs::write(path, json).map_err(|source| io_error(path, source))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
    serde_json::from_str(&content).map_err(|source| ManifestError::Json {
        path: path.display().to_string(),
        source,
    })
}

fn io_error(path: &Path, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.display().to_string(),
        source,
    }
}
