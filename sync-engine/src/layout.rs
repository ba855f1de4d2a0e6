//! On-disk contract between the scanner and the fetch executor.
//!
//! The working tree root holds one directory per song identifier:
//!
//! ```text
//! <root>/<song_id>/asset.json        sidecar marker (identity + fingerprint)
//! <root>/<song_id>/<audio file>      e.g. "Title - Artist.mp3"
//! <root>/<song_id>/lyrics.lrc        optional
//! <root>/<song_id>/lyrics.trans.txt  optional translated lyrics
//! <root>/.staging/<song_id>/         executor-private, ignored by the scanner
//! ```
//!
//! Identity and staleness come from the sidecar, never from re-hashing file
//! contents. A directory without a valid sidecar is an orphan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sync_traits::SongId;

/// Sidecar marker file name inside each asset directory.
pub const SIDECAR_FILE: &str = "asset.json";

/// Lyric file names are fixed; only the audio file name varies.
pub const LYRICS_FILE: &str = "lyrics.lrc";
pub const TRANSLATED_LYRICS_FILE: &str = "lyrics.trans.txt";

/// Name of the executor-private staging directory under the root.
pub const STAGING_DIR: &str = ".staging";

/// Path construction for the working tree.
#[derive(Debug, Clone)]
pub struct ArchiveLayout {
    root: PathBuf,
}

impl ArchiveLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final location of one asset directory.
    pub fn asset_dir(&self, song_id: &SongId) -> PathBuf {
        self.root.join(song_id.as_str())
    }

    pub fn staging_root(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Staging location for one fetch. Workers own disjoint identifier-keyed
    /// subdirectories, so no locking is needed for staging writes.
    pub fn staging_dir(&self, song_id: &SongId) -> PathBuf {
        self.staging_root().join(song_id.as_str())
    }
}

/// Sidecar marker contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sidecar {
    pub song_id: SongId,
    pub fingerprint: String,
    pub audio_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyrics_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_lyrics_file: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Derive a cross-platform-safe file name from a provider display name.
///
/// Invalid path characters become underscores, whitespace runs collapse to
/// one space, and the stem is capped so the full name stays well under
/// common path limits.
pub fn sanitize_file_stem(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_space = true;
    for ch in name.chars() {
        let mapped = match ch {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_whitespace() => ' ',
            c => c,
        };
        if mapped == ' ' {
            if last_was_space {
                continue;
            }
            last_was_space = true;
        } else {
            last_was_space = false;
        }
        out.push(mapped);
    }
    let trimmed = out.trim_end();
    trimmed.chars().take(200).collect()
}
