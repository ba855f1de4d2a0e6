//! # MCP Catalog Client
//!
//! Implements `CatalogSource` against the catalog service's JSON tool-call
//! endpoint. The service exposes database tables through named tools; the
//! engine only ever calls `list_music_data` on the `songs` table to read the
//! full desired-state snapshot.
//!
//! Transient transport failures (timeouts, 429, 5xx) are retried internally
//! with exponential backoff; what escapes as `CatalogError` is a fatal
//! precondition for the reconciliation pass.

pub mod client;
pub mod types;

pub use client::{McpCatalogClient, McpCatalogConfig};
