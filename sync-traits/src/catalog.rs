//! Catalog Service Abstraction
//!
//! The catalog owns the desired state: the authoritative list of songs the
//! working tree must materialize. The engine only ever reads a full snapshot;
//! catalog mutation lives entirely outside this workspace.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier of a catalog song record.
///
/// Opaque to the engine; also used as the per-asset directory name in the
/// working tree, so it must be filesystem-safe (the catalog guarantees this
/// by using numeric database ids).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(String);

impl SongId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SongId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SongId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One catalog record. Read-only input to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    /// Not every catalog row carries an album; when present it participates
    /// in the content fingerprint.
    pub album: Option<String>,
}

/// Errors from the catalog boundary. All of them are fatal preconditions
/// for a reconciliation pass: no mutation happens after one of these.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog unreachable: {0}")]
    Unreachable(String),

    #[error("catalog protocol error: {0}")]
    Protocol(String),

    #[error("catalog rejected request: {0}")]
    Rejected(String),
}

/// Read access to the catalog's current desired state.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the full current song list.
    ///
    /// Implementations retry transient transport failures internally;
    /// an error returned here means the snapshot could not be obtained
    /// and the pass must abort before any mutation.
    async fn list_songs(&self) -> Result<Vec<Song>, CatalogError>;
}
