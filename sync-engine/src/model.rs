//! Content fingerprints and materialized assets.
//!
//! A `Fingerprint` is derived from every catalog field that affects the
//! downloaded artifact. It is the system's sole idempotence key: an asset
//! whose stored fingerprint equals its song's current fingerprint is up to
//! date, no matter how either was produced.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use sync_traits::{Song, SongId};

/// SHA-256 over a song's content fields, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derive the fingerprint for a song's current content fields.
    ///
    /// Fields are joined with NUL separators so that moving characters
    /// between fields can never collide ("ab" + "c" vs "a" + "bc").
    pub fn of(song: &Song) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(song.title.as_bytes());
        hasher.update([0u8]);
        hasher.update(song.artist.as_bytes());
        hasher.update([0u8]);
        hasher.update(song.album.as_deref().unwrap_or("").as_bytes());
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            use std::fmt::Write;
            let _ = write!(hex, "{:02x}", byte);
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a stored fingerprint read back from a sidecar marker.
    pub fn from_stored(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One materialized asset directory in the working tree.
///
/// `fingerprint` is `None` for orphans: directories whose sidecar marker is
/// missing, unreadable, or references files that do not exist. An orphan is
/// never current, so the diff engine re-fetches it when its song still
/// exists and removes it when it does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub song_id: SongId,
    pub fingerprint: Option<Fingerprint>,
    pub path: PathBuf,
}

impl Asset {
    pub fn is_orphan(&self) -> bool {
        self.fingerprint.is_none()
    }

    /// Whether this asset already materializes the given song version.
    pub fn matches(&self, song: &Song) -> bool {
        self.fingerprint
            .as_ref()
            .is_some_and(|fp| *fp == Fingerprint::of(song))
    }
}
