//! Download Provider Abstraction
//!
//! A provider resolves one song (by artist + title) to an audio byte stream
//! and optional lyric blobs, or a classified failure. Classification is the
//! contract that matters here: the fetch executor retries transient errors
//! with backoff and records permanent ones without retrying.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// What the executor asks a provider for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackQuery {
    pub artist: String,
    pub title: String,
}

impl TrackQuery {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }
}

impl std::fmt::Display for TrackQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// Everything a provider returns for one song.
#[derive(Debug, Clone)]
pub struct TrackBundle {
    /// Full audio file contents.
    pub audio: Bytes,
    /// Provider-reported container format, used as the file extension
    /// ("mp3", "flac", ...).
    pub audio_format: String,
    /// Canonical "title - artist" as the provider knows the track; used
    /// for the human-readable audio file name.
    pub display_name: String,
    /// LRC lyric body, if the provider has one.
    pub lyrics: Option<String>,
    /// Translated lyric body, if the provider has one.
    pub translated_lyrics: Option<String>,
}

/// Classified provider failures.
///
/// `RateLimited` and `Transient` are retryable; `RateLimited` additionally
/// penalizes the pool-wide rate gate. `NotFound` and `Malformed` are
/// permanent and recorded per-operation without retry.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("provider rate limited: {reason}")]
    RateLimited { reason: String },

    #[error("transient provider error: {reason}")]
    Transient { reason: String },

    #[error("track not found for query '{query}'")]
    NotFound { query: String },

    #[error("malformed provider response: {reason}")]
    Malformed { reason: String },
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. } | ProviderError::Transient { .. }
        )
    }
}

/// External download provider.
#[async_trait]
pub trait TrackProvider: Send + Sync {
    /// Resolve a query to a full track bundle.
    ///
    /// One call performs the whole provider-side flow (search, URL
    /// resolution, lyric lookup, download). Implementations must not retry
    /// internally; retry policy belongs to the fetch executor so that
    /// backoff and rate-gate penalties apply pool-wide.
    async fn fetch_track(&self, query: &TrackQuery) -> Result<TrackBundle, ProviderError>;
}
