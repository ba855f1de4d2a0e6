//! # tunesync
//!
//! One-shot reconciliation of a git-tracked music archive against its
//! catalog. Exit codes: 0 for a full pass (or nothing to do), 2 for a
//! partial pass that committed with failures, 1 for an aborted pass.

mod config;
mod git;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use catalog_mcp::{McpCatalogClient, McpCatalogConfig};
use provider_vkeys::{VkeysConfig, VkeysConnector};
use sync_engine::{ArchiveLayout, PassOutcome, Reconciler};

use crate::config::{Cli, LogFormat};
use crate::git::GitCommitSink;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut catalog_config = McpCatalogConfig::new(&cli.catalog_url);
    catalog_config.timeout = cli.http_timeout();
    catalog_config.retry = cli.retry_policy();
    let catalog = Arc::new(
        McpCatalogClient::new(catalog_config).context("catalog client initialization")?,
    );

    let mut provider_config = VkeysConfig::new(&cli.provider_url);
    provider_config.timeout = cli.http_timeout();
    let provider =
        Arc::new(VkeysConnector::new(provider_config).context("provider initialization")?);

    let sink = Arc::new(GitCommitSink::new(!cli.no_push));
    let layout = ArchiveLayout::new(cli.archive_dir.clone());
    let reconciler = Reconciler::new(cli.engine_config(), layout, catalog, provider, sink);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, aborting after in-flight operations");
            signal_cancel.cancel();
        }
    });

    let report = reconciler.run_pass(&cancel).await?;

    if cli.report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(match report.outcome {
        PassOutcome::Committed { .. } | PassOutcome::NoChanges => ExitCode::SUCCESS,
        PassOutcome::CommittedPartial { .. } => ExitCode::from(2),
        PassOutcome::Aborted { .. } => ExitCode::FAILURE,
    })
}
