//! Fetch Executor
//!
//! Executes one `Fetch` operation: resolve the song against the download
//! provider, write the audio + lyrics pair into a staging directory keyed by
//! identifier, then swap the staged directory into place. The sidecar marker
//! is written last inside staging and the swap is a single rename, so a
//! partially written pair is never visible to the scanner.
//!
//! Failure handling follows the engine-wide taxonomy: transient provider
//! errors are retried with exponential backoff up to the policy cap and then
//! reclassified as permanent; permanent errors fail the operation
//! immediately. Either way the outcome is recorded, never silently dropped,
//! and never aborts sibling operations.

use crate::layout::{
    sanitize_file_stem, ArchiveLayout, Sidecar, LYRICS_FILE, SIDECAR_FILE,
    TRANSLATED_LYRICS_FILE,
};
use crate::model::Fingerprint;
use crate::ratelimit::RateGate;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use sync_traits::{ProviderError, RetryPolicy, Song, TrackBundle, TrackProvider, TrackQuery};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Extra pool-wide delay applied when the provider reports rate limiting.
const RATE_LIMIT_PENALTY: Duration = Duration::from_secs(10);

/// Successful fetch of one asset pair.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub song_id: sync_traits::SongId,
    pub audio_file: String,
    pub bytes_written: u64,
}

/// Failed fetch of one asset pair, after retries were exhausted or the
/// error was permanent.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub song_id: sync_traits::SongId,
    pub reason: String,
    pub attempts: u32,
}

pub struct FetchExecutor {
    provider: Arc<dyn TrackProvider>,
    gate: Arc<RateGate>,
    retry: RetryPolicy,
    layout: ArchiveLayout,
}

impl FetchExecutor {
    pub fn new(
        provider: Arc<dyn TrackProvider>,
        gate: Arc<RateGate>,
        retry: RetryPolicy,
        layout: ArchiveLayout,
    ) -> Self {
        Self {
            provider,
            gate,
            retry,
            layout,
        }
    }

    /// Execute one fetch operation end to end.
    pub async fn fetch(
        &self,
        song: &Song,
        cancel: &CancellationToken,
    ) -> Result<FetchedAsset, FetchFailure> {
        let query = TrackQuery::new(&song.artist, &song.title);
        let mut attempt: u32 = 0;

        let bundle = loop {
            if cancel.is_cancelled() {
                return Err(FetchFailure {
                    song_id: song.id.clone(),
                    reason: "pass cancelled".to_string(),
                    attempts: attempt,
                });
            }

            self.gate.admit().await;
            attempt += 1;
            debug!(song_id = %song.id, attempt, "fetching track");

            match self.provider.fetch_track(&query).await {
                Ok(bundle) => break bundle,
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    if matches!(err, ProviderError::RateLimited { .. }) {
                        self.gate.penalize(RATE_LIMIT_PENALTY);
                    }
                    let delay = self.retry.delay_for(attempt - 1);
                    warn!(
                        song_id = %song.id,
                        attempt,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "transient provider error, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    // Exhausted transients are reclassified as permanent here.
                    warn!(song_id = %song.id, attempt, error = %err, "fetch failed");
                    return Err(FetchFailure {
                        song_id: song.id.clone(),
                        reason: err.to_string(),
                        attempts: attempt,
                    });
                }
            }
        };

        self.materialize(song, bundle)
            .await
            .map_err(|err| FetchFailure {
                song_id: song.id.clone(),
                reason: format!("failed to write asset pair: {err}"),
                attempts: attempt,
            })
    }

    /// Write the bundle under `.staging/<id>/` and swap it into place.
    async fn materialize(&self, song: &Song, bundle: TrackBundle) -> std::io::Result<FetchedAsset> {
        let staging = self.layout.staging_dir(&song.id);
        // Leftovers from an interrupted pass are invisible to the scanner;
        // just clear them.
        remove_dir_if_present(&staging).await?;
        tokio::fs::create_dir_all(&staging).await?;

        let audio_file = format!(
            "{}.{}",
            sanitize_file_stem(&bundle.display_name),
            bundle.audio_format
        );
        let bytes_written = bundle.audio.len() as u64;
        tokio::fs::write(staging.join(&audio_file), &bundle.audio).await?;

        let lyrics_file = match non_empty(bundle.lyrics) {
            Some(body) => {
                tokio::fs::write(staging.join(LYRICS_FILE), body).await?;
                Some(LYRICS_FILE.to_string())
            }
            None => None,
        };
        let translated_lyrics_file = match non_empty(bundle.translated_lyrics) {
            Some(body) => {
                tokio::fs::write(staging.join(TRANSLATED_LYRICS_FILE), body).await?;
                Some(TRANSLATED_LYRICS_FILE.to_string())
            }
            None => None,
        };

        // Sidecar last: a staged directory without one is never promoted to
        // an asset even if the swap below is interrupted.
        let sidecar = Sidecar {
            song_id: song.id.clone(),
            fingerprint: Fingerprint::of(song).as_str().to_string(),
            audio_file: audio_file.clone(),
            lyrics_file,
            translated_lyrics_file,
            fetched_at: chrono::Utc::now(),
        };
        tokio::fs::write(
            staging.join(SIDECAR_FILE),
            serde_json::to_vec_pretty(&sidecar)
                .map_err(|err| std::io::Error::other(err.to_string()))?,
        )
        .await?;

        let dest = self.layout.asset_dir(&song.id);
        remove_dir_if_present(&dest).await?;
        tokio::fs::rename(&staging, &dest).await?;

        debug!(song_id = %song.id, audio_file, bytes = bytes_written, "asset materialized");
        Ok(FetchedAsset {
            song_id: song.id.clone(),
            audio_file,
            bytes_written,
        })
    }
}

fn non_empty(body: Option<String>) -> Option<String> {
    body.filter(|s| !s.trim().is_empty())
}

async fn remove_dir_if_present(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
