//! Wire types for the vkeys music API.
//!
//! Every endpoint wraps its payload in `{ "code": <i64>, "data": ... }`;
//! `code == 200` with a non-null `data` is the only success shape.

use serde::Deserialize;

/// Common response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

/// One search hit from `GET {base}?word=...`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    /// Track title as the provider knows it.
    pub song: String,
    /// Artist name as the provider knows it.
    pub singer: String,
    /// Provider-internal track id, fed to the detail endpoints.
    pub id: i64,
}

/// Payload of `GET {base}/geturl?id=...`.
#[derive(Debug, Deserialize)]
pub struct TrackDetails {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

/// Payload of `GET {base}/lyric?id=...`.
#[derive(Debug, Deserialize)]
pub struct LyricBody {
    #[serde(default)]
    pub lrc: Option<String>,
    #[serde(default)]
    pub trans: Option<String>,
}
