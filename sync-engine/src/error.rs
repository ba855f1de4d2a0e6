use std::path::PathBuf;
use sync_traits::{CatalogError, CommitError, SongId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("catalog snapshot failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("working tree unreadable at {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove asset {song_id}: {source}")]
    Remove {
        song_id: SongId,
        #[source]
        source: std::io::Error,
    },

    #[error("commit failed: {0}")]
    Commit(#[from] CommitError),

    #[error("reconciliation pass cancelled")]
    Cancelled,

    #[error("invalid pass state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;
