//! Wire types for the catalog service's tool-call protocol.
//!
//! The endpoint wraps tool output in a JSON envelope whose `output` field is
//! itself a JSON-encoded string; both layers are modeled here.

use serde::{Deserialize, Serialize};

/// Request body for `POST {base}/mcp`.
#[derive(Debug, Serialize)]
pub struct ToolCall<'a> {
    pub tool_name: &'a str,
    pub args: ListArgs<'a>,
}

#[derive(Debug, Serialize)]
pub struct ListArgs<'a> {
    pub table_name: &'a str,
    pub limit: u32,
}

/// Outer response envelope; `output` is a JSON string.
#[derive(Debug, Deserialize)]
pub struct ToolEnvelope {
    pub output: String,
}

/// Inner tool output payload.
#[derive(Debug, Deserialize)]
pub struct ToolOutput {
    pub status: String,
    #[serde(default)]
    pub data: Vec<SongRow>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One row of the `songs` table.
#[derive(Debug, Clone, Deserialize)]
pub struct SongRow {
    pub song_id: i64,
    pub artist: String,
    pub song_name: String,
    #[serde(default)]
    pub album: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_output_parses_song_rows() {
        let inner = r#"{"status":"success","data":[
            {"song_id":1,"artist":"X","song_name":"A"},
            {"song_id":2,"artist":"Y","song_name":"B","album":"Alb"}
        ]}"#;
        let output: ToolOutput = serde_json::from_str(inner).unwrap();
        assert_eq!(output.status, "success");
        assert_eq!(output.data.len(), 2);
        assert_eq!(output.data[0].song_name, "A");
        assert_eq!(output.data[1].album.as_deref(), Some("Alb"));
    }

    #[test]
    fn error_output_parses_without_data() {
        let inner = r#"{"status":"error","message":"query failed"}"#;
        let output: ToolOutput = serde_json::from_str(inner).unwrap();
        assert_eq!(output.status, "error");
        assert!(output.data.is_empty());
        assert_eq!(output.message.as_deref(), Some("query failed"));
    }
}
