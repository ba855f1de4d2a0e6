//! Working-Tree Scanner
//!
//! Enumerates the currently materialized assets. Identity and staleness come
//! from each directory's sidecar marker; file contents are never re-hashed.
//! Incomplete pairs (missing sidecar, missing audio, missing lyric files the
//! sidecar references) and directories with undecodable names are reported
//! as orphans rather than crashing the pass, so the diff engine re-fetches
//! or removes them. Only unreadable storage is fatal.

use crate::error::{Result, SyncError};
use crate::layout::{ArchiveLayout, Sidecar, SIDECAR_FILE, STAGING_DIR};
use crate::model::{Asset, Fingerprint};
use std::path::Path;
use sync_traits::SongId;
use tracing::{debug, warn};

/// Scan the working tree and return the actual-state snapshot.
///
/// A missing root is an empty tree (first run). Entries under the root that
/// are not directories, plus the staging directory, are ignored.
pub async fn scan(layout: &ArchiveLayout) -> Result<Vec<Asset>> {
    let root = layout.root();
    let mut dir = match tokio::fs::read_dir(root).await {
        Ok(dir) => dir,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(root = %root.display(), "working tree does not exist yet");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(SyncError::Scan {
                path: root.to_path_buf(),
                source,
            })
        }
    };

    let mut assets = Vec::new();
    loop {
        let entry = match dir.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(source) => {
                return Err(SyncError::Scan {
                    path: root.to_path_buf(),
                    source,
                })
            }
        };

        let raw_name = entry.file_name();
        let name = match raw_name.to_str() {
            Some(name) => name.to_string(),
            None => {
                // Lossy identifiers never match a catalog id, so these
                // directories diff as removable orphans instead of
                // lingering invisibly.
                let lossy = raw_name.to_string_lossy().into_owned();
                warn!(entry = %lossy, "non-UTF-8 entry name, treating as orphan");
                lossy
            }
        };
        if name == STAGING_DIR || name.starts_with('.') {
            continue;
        }
        let file_type = entry.file_type().await.map_err(|source| SyncError::Scan {
            path: entry.path(),
            source,
        })?;
        if !file_type.is_dir() {
            debug!(entry = %name, "skipping non-directory entry");
            continue;
        }

        let song_id = SongId::new(name);
        let path = entry.path();
        let fingerprint = read_fingerprint(&path, &song_id).await?;
        if fingerprint.is_none() {
            warn!(song_id = %song_id, path = %path.display(), "orphaned asset directory");
        }
        assets.push(Asset {
            song_id,
            fingerprint,
            path,
        });
    }

    debug!(count = assets.len(), "scanned working tree");
    Ok(assets)
}

/// Read and validate one directory's sidecar. `None` marks an orphan.
async fn read_fingerprint(dir: &Path, song_id: &SongId) -> Result<Option<Fingerprint>> {
    let sidecar_path = dir.join(SIDECAR_FILE);
    let raw = match tokio::fs::read(&sidecar_path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SyncError::Scan {
                path: sidecar_path,
                source,
            })
        }
    };

    let sidecar: Sidecar = match serde_json::from_slice(&raw) {
        Ok(sidecar) => sidecar,
        Err(err) => {
            warn!(song_id = %song_id, error = %err, "unparseable sidecar");
            return Ok(None);
        }
    };

    if sidecar.song_id != *song_id {
        warn!(
            song_id = %song_id,
            sidecar_id = %sidecar.song_id,
            "sidecar identity does not match directory name"
        );
        return Ok(None);
    }

    let mut referenced = vec![sidecar.audio_file.clone()];
    referenced.extend(sidecar.lyrics_file.clone());
    referenced.extend(sidecar.translated_lyrics_file.clone());
    for file in referenced {
        match tokio::fs::try_exists(dir.join(&file)).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(song_id = %song_id, file = file, "sidecar references missing file");
                return Ok(None);
            }
            Err(source) => {
                return Err(SyncError::Scan {
                    path: dir.join(&file),
                    source,
                })
            }
        }
    }

    Ok(Some(Fingerprint::from_stored(sidecar.fingerprint)))
}
