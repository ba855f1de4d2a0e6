//! Diff Engine
//!
//! Pure function over two immutable snapshots: the catalog's desired song
//! list and the working tree's actual assets. Produces an ordered changeset
//! with removes listed before fetches. No identifier appears in more than
//! one operation, by construction: songs and assets are both keyed uniquely
//! by identifier.

use crate::model::Asset;
use std::collections::HashMap;
use std::path::PathBuf;
use sync_traits::{Song, SongId};
use tracing::debug;

/// A planned removal of one asset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOp {
    pub song_id: SongId,
    pub path: PathBuf,
}

/// Ordered collection of operations for one pass.
///
/// Fetch fully replaces the asset pair, so a stale fingerprint plans a
/// fetch rather than a separate update operation.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Executed first, so a commit never mixes a stale removal with a
    /// fresh fetch for the same identifier.
    pub removes: Vec<RemoveOp>,
    pub fetches: Vec<Song>,
    /// Assets already current; the steady-state majority path.
    pub skipped: u64,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.removes.is_empty() && self.fetches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.removes.len() + self.fetches.len()
    }
}

/// Compute the changeset that reconciles `assets` to `songs`.
///
/// - song without a matching-fingerprint asset → fetch (covers both the
///   missing and the stale/orphaned case)
/// - asset without a song → remove
/// - matching fingerprint → skipped
pub fn plan(songs: &[Song], assets: &[Asset]) -> ChangeSet {
    let by_id: HashMap<&SongId, &Asset> =
        assets.iter().map(|asset| (&asset.song_id, asset)).collect();

    let mut changeset = ChangeSet::default();

    for song in songs {
        match by_id.get(&song.id) {
            Some(asset) if asset.matches(song) => changeset.skipped += 1,
            Some(asset) => {
                debug!(song_id = %song.id, orphan = asset.is_orphan(), "asset stale, planning fetch");
                changeset.fetches.push(song.clone());
            }
            None => changeset.fetches.push(song.clone()),
        }
    }

    let desired: HashMap<&SongId, ()> = songs.iter().map(|song| (&song.id, ())).collect();
    for asset in assets {
        if !desired.contains_key(&asset.song_id) {
            changeset.removes.push(RemoveOp {
                song_id: asset.song_id.clone(),
                path: asset.path.clone(),
            });
        }
    }
    // Deterministic plan order for logs and tests.
    changeset.removes.sort_by(|a, b| a.song_id.cmp(&b.song_id));

    changeset
}
