//! vkeys connector: search, URL resolution, lyric lookup, download.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use sync_traits::{ProviderError, TrackBundle, TrackProvider, TrackQuery};

use crate::types::{Envelope, LyricBody, SearchHit, TrackDetails};

const DEFAULT_AUDIO_FORMAT: &str = "mp3";

/// How a search result list is narrowed to one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Trust the provider's ranking and take the first hit.
    #[default]
    FirstMatch,
}

/// Configuration for [`VkeysConnector`].
#[derive(Debug, Clone)]
pub struct VkeysConfig {
    /// API base, e.g. `https://api.vkeys.cn/v2/music/tencent`. Search is a
    /// bare GET on the base; detail endpoints are path suffixes.
    pub base_url: String,
    /// Per-request timeout, applied to API calls and the audio download.
    pub timeout: Duration,
    /// Search-result selection policy.
    pub match_policy: MatchPolicy,
}

impl VkeysConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            match_policy: MatchPolicy::default(),
        }
    }
}

/// `TrackProvider` backed by the vkeys music API.
///
/// Performs no retries of its own; every error is classified and surfaced so
/// the fetch executor can decide what to do pool-wide.
pub struct VkeysConnector {
    config: VkeysConfig,
    http: reqwest::Client,
}

impl VkeysConnector {
    pub fn new(config: VkeysConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Transient {
                reason: format!("http client init failed: {e}"),
            })?;
        Ok(Self { config, http })
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// GET an enveloped endpoint and unwrap its payload. A non-200 envelope
    /// code or null `data` comes back as `Ok(None)`; the caller decides what
    /// that means for its step.
    async fn get_payload<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Option<T>, ProviderError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        let envelope: Envelope<T> =
            response.json().await.map_err(|e| ProviderError::Malformed {
                reason: format!("bad envelope: {e}"),
            })?;

        if envelope.code != 200 {
            debug!(code = envelope.code, url, "provider returned non-success code");
            return Ok(None);
        }
        Ok(envelope.data)
    }

    async fn search(&self, word: &str) -> Result<Option<SearchHit>, ProviderError> {
        let url = format!("{}?word={}", self.base(), urlencoding::encode(word));
        let hits: Option<Vec<SearchHit>> = self.get_payload(&url).await?;
        Ok(hits.and_then(|mut hits| match self.config.match_policy {
            MatchPolicy::FirstMatch => {
                if hits.is_empty() {
                    None
                } else {
                    Some(hits.remove(0))
                }
            }
        }))
    }

    async fn resolve_details(&self, track_id: i64) -> Result<TrackDetails, ProviderError> {
        let url = format!("{}/geturl?id={track_id}", self.base());
        self.get_payload(&url)
            .await?
            .ok_or_else(|| ProviderError::Malformed {
                reason: format!("no download details for track {track_id}"),
            })
    }

    /// Lyric lookup never fails a track: a missing or broken lyric endpoint
    /// just means the bundle carries no lyrics.
    async fn fetch_lyrics(&self, track_id: i64) -> (Option<String>, Option<String>) {
        let url = format!("{}/lyric?id={track_id}", self.base());
        match self.get_payload::<LyricBody>(&url).await {
            Ok(Some(body)) => (non_empty(body.lrc), non_empty(body.trans)),
            Ok(None) => (None, None),
            Err(err) => {
                warn!(track_id, error = %err, "lyric lookup failed, continuing without");
                (None, None)
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Bytes, ProviderError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        response.bytes().await.map_err(classify_transport)
    }
}

#[async_trait]
impl TrackProvider for VkeysConnector {
    async fn fetch_track(&self, query: &TrackQuery) -> Result<TrackBundle, ProviderError> {
        let word = normalize_query(query);

        let hit = self
            .search(&word)
            .await?
            .ok_or_else(|| ProviderError::NotFound {
                query: query.to_string(),
            })?;
        debug!(
            track_id = hit.id,
            song = %hit.song,
            singer = %hit.singer,
            "search resolved"
        );

        let details = self.resolve_details(hit.id).await?;
        let url = details.url.ok_or_else(|| ProviderError::Malformed {
            reason: format!("no download url for track {}", hit.id),
        })?;
        let audio_format = details
            .format
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_AUDIO_FORMAT.to_string());

        let (lyrics, translated_lyrics) = self.fetch_lyrics(hit.id).await;

        let audio = self.download(&url).await?;

        Ok(TrackBundle {
            audio,
            audio_format,
            display_name: format!("{} - {}", hit.song, hit.singer),
            lyrics,
            translated_lyrics,
        })
    }
}

/// Search terms: "artist title" with hyphens flattened to spaces, whitespace
/// collapsed. Hyphenated query fragments confuse the search endpoint.
fn normalize_query(query: &TrackQuery) -> String {
    let raw = format!("{} {}", query.artist, query.title).replace('-', " ");
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn classify_transport(err: reqwest::Error) -> ProviderError {
    ProviderError::Transient {
        reason: err.to_string(),
    }
}

fn classify_status(status: StatusCode) -> ProviderError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        ProviderError::RateLimited {
            reason: format!("provider returned {status}"),
        }
    } else if status.is_server_error() {
        ProviderError::Transient {
            reason: format!("provider returned {status}"),
        }
    } else {
        ProviderError::Malformed {
            reason: format!("provider returned {status}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_normalization_flattens_hyphens_and_whitespace() {
        let query = TrackQuery::new("Some-Artist", "A  Long - Title");
        assert_eq!(normalize_query(&query), "Some Artist A Long Title");
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY),
            ProviderError::Transient { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN),
            ProviderError::Malformed { .. }
        ));
    }

    #[test]
    fn empty_lyric_bodies_become_none() {
        assert_eq!(non_empty(Some("  \n".to_string())), None);
        assert_eq!(non_empty(Some("[00:01] hi".to_string())).as_deref(), Some("[00:01] hi"));
        assert_eq!(non_empty(None), None);
    }
}
