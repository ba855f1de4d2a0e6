//! HTTP client for the catalog tool-call endpoint.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use sync_traits::{CatalogError, CatalogSource, RetryPolicy, Song, SongId};

use crate::types::{ListArgs, SongRow, ToolCall, ToolEnvelope, ToolOutput};

const LIST_TOOL: &str = "list_music_data";

/// Configuration for [`McpCatalogClient`].
#[derive(Debug, Clone)]
pub struct McpCatalogConfig {
    /// Service base URL; the tool endpoint lives at `{base_url}/mcp`.
    pub base_url: String,
    /// Table the list tool reads from.
    pub table: String,
    /// Row cap sent with every list call.
    pub page_limit: u32,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy for transient transport failures.
    pub retry: RetryPolicy,
}

impl McpCatalogConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            table: "songs".to_string(),
            page_limit: 10_000,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// `CatalogSource` backed by the catalog service's tool-call endpoint.
pub struct McpCatalogClient {
    config: McpCatalogConfig,
    http: reqwest::Client,
}

impl McpCatalogClient {
    pub fn new(config: McpCatalogConfig) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::Unreachable(format!("http client init failed: {e}")))?;
        Ok(Self { config, http })
    }

    fn endpoint(&self) -> String {
        format!("{}/mcp", self.config.base_url.trim_end_matches('/'))
    }

    /// One request/response cycle. `Err(true)` means retryable.
    async fn list_once(&self) -> Result<Vec<SongRow>, (CatalogError, bool)> {
        let body = ToolCall {
            tool_name: LIST_TOOL,
            args: ListArgs {
                table_name: &self.config.table,
                limit: self.config.page_limit,
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let retryable = e.is_timeout() || e.is_connect() || e.is_request();
                (CatalogError::Unreachable(e.to_string()), retryable)
            })?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err((
                CatalogError::Unreachable(format!("catalog returned {status}")),
                true,
            ));
        }
        if !status.is_success() {
            return Err((
                CatalogError::Rejected(format!("catalog returned {status}")),
                false,
            ));
        }

        let envelope: ToolEnvelope = response
            .json()
            .await
            .map_err(|e| (CatalogError::Protocol(format!("bad envelope: {e}")), false))?;

        let output: ToolOutput = serde_json::from_str(&envelope.output)
            .map_err(|e| (CatalogError::Protocol(format!("bad tool output: {e}")), false))?;

        if output.status != "success" {
            let message = output.message.unwrap_or_else(|| "no message".to_string());
            return Err((
                CatalogError::Rejected(format!("tool status {}: {message}", output.status)),
                false,
            ));
        }

        Ok(output.data)
    }
}

#[async_trait]
impl CatalogSource for McpCatalogClient {
    async fn list_songs(&self) -> Result<Vec<Song>, CatalogError> {
        let mut attempt: u32 = 0;
        loop {
            match self.list_once().await {
                Ok(rows) => {
                    debug!(rows = rows.len(), "catalog snapshot fetched");
                    return Ok(rows.into_iter().map(song_from_row).collect());
                }
                Err((err, retryable)) => {
                    attempt += 1;
                    if !retryable || attempt >= self.config.retry.max_attempts {
                        return Err(err);
                    }
                    let delay = self.config.retry.delay_for(attempt - 1);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "catalog request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn song_from_row(row: SongRow) -> Song {
    Song {
        id: SongId::new(row.song_id.to_string()),
        title: row.song_name,
        artist: row.artist,
        album: row.album,
    }
}
