//! Command line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use sync_engine::EngineConfig;
use sync_traits::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable output for interactive runs.
    Pretty,
    /// Line-delimited JSON for scheduled runs.
    Json,
}

/// Reconcile a git-tracked music archive against its catalog.
///
/// One invocation runs exactly one pass: read the catalog snapshot, diff it
/// against the archive, fetch and remove what differs, commit the result.
#[derive(Debug, Parser)]
#[command(name = "tunesync", version)]
pub struct Cli {
    /// Catalog service base URL; the tool endpoint lives at {url}/mcp.
    #[arg(long, env = "MCP_SERVICE_URL")]
    pub catalog_url: String,

    /// Download provider base URL.
    #[arg(
        long,
        env = "VKEYS_BASE_URL",
        default_value = "https://api.vkeys.cn/v2/music/tencent"
    )]
    pub provider_url: String,

    /// Archive root. Must live inside a git work tree.
    #[arg(long, env = "ARCHIVE_DIR", default_value = "downloads")]
    pub archive_dir: PathBuf,

    /// Fetch worker pool size.
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Attempts per song before recording a permanent fetch failure.
    #[arg(long, default_value_t = 4)]
    pub max_attempts: u32,

    /// Minimum spacing between provider calls across the pool, milliseconds.
    #[arg(long, default_value_t = 2000)]
    pub provider_interval_ms: u64,

    /// Per-request HTTP timeout, seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Commit locally but skip `git push`.
    #[arg(long)]
    pub no_push: bool,

    /// Print the full pass report as JSON on stdout.
    #[arg(long)]
    pub report_json: bool,

    /// Log output format.
    #[arg(long, value_enum, default_value = "pretty")]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            ..RetryPolicy::default()
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_concurrent_fetches: self.concurrency.max(1),
            fetch_retry: self.retry_policy(),
            min_provider_interval: Duration::from_millis(self.provider_interval_ms),
        }
    }
}
