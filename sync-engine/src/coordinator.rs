//! Reconciliation Coordinator
//!
//! Drives one pass end to end: catalog snapshot + working-tree scan → diff →
//! removes, then fetches across a bounded worker pool → evaluate → commit
//! gate. Every operation outcome lands in the `ReconciliationReport`.
//!
//! ## Decision policy
//!
//! Removes are plain filesystem deletes and are never expected to fail; a
//! remove failure indicates an environment problem and aborts the pass.
//! Failed fetches do not: the pass still commits the successful subset and
//! the report flags it as partial, enumerating the failing identifiers.
//! Losing one song's download must not block sync of all the others.
//!
//! ## Cancellation
//!
//! The whole pass is cancellable through a `CancellationToken`. In-flight
//! fetch workers are abandoned at their next retry boundary; a cancelled
//! pass aborts and never commits.

use crate::commit::CommitGate;
use crate::diff::{self, ChangeSet};
use crate::error::{Result, SyncError};
use crate::executor::FetchExecutor;
use crate::layout::ArchiveLayout;
use crate::pass::{
    FailedFetch, PassOutcome, PassState, ReconciliationPass, ReconciliationReport,
};
use crate::ratelimit::RateGate;
use crate::scanner;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use sync_traits::{CatalogSource, CommitOutcome, CommitSink, RetryPolicy, TrackProvider};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Size of the fetch worker pool.
    pub max_concurrent_fetches: usize,

    /// Retry policy for transient provider errors.
    pub fetch_retry: RetryPolicy,

    /// Minimum spacing between provider calls across the whole pool.
    pub min_provider_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 4,
            fetch_retry: RetryPolicy::default(),
            min_provider_interval: Duration::from_secs(2),
        }
    }
}

/// Running counters for one pass; folded into the terminal report even when
/// the pass aborts partway through.
#[derive(Debug, Default)]
struct PassStats {
    fetched: u64,
    removed: u64,
    skipped: u64,
    failed: Vec<FailedFetch>,
}

/// Orchestrates reconciliation passes.
pub struct Reconciler {
    config: EngineConfig,
    layout: ArchiveLayout,
    catalog: Arc<dyn CatalogSource>,
    executor: FetchExecutor,
    gate: CommitGate,
}

impl Reconciler {
    pub fn new(
        config: EngineConfig,
        layout: ArchiveLayout,
        catalog: Arc<dyn CatalogSource>,
        provider: Arc<dyn TrackProvider>,
        sink: Arc<dyn CommitSink>,
    ) -> Self {
        let rate_gate = Arc::new(RateGate::new(config.min_provider_interval));
        let executor = FetchExecutor::new(
            provider,
            rate_gate,
            config.fetch_retry.clone(),
            layout.clone(),
        );
        Self {
            config,
            layout,
            catalog,
            executor,
            gate: CommitGate::new(sink),
        }
    }

    /// Run exactly one reconciliation pass.
    ///
    /// Always yields a report: fatal conditions surface as an `Aborted`
    /// outcome carrying whatever counts had accumulated, so callers can
    /// distinguish full success, partial success, and total abort from one
    /// artifact.
    #[instrument(skip_all, fields(pass_id))]
    pub async fn run_pass(&self, cancel: &CancellationToken) -> Result<ReconciliationReport> {
        let mut pass = ReconciliationPass::new();
        tracing::Span::current().record("pass_id", pass.id.to_string());
        let mut stats = PassStats::default();

        let outcome = match self.execute_pass(&mut pass, &mut stats, cancel).await {
            Ok(outcome) => {
                pass.advance(PassState::Done)?;
                outcome
            }
            Err(err) => {
                error!(error = %err, state = %pass.state(), "pass aborted");
                pass.abort();
                pass.advance(PassState::Done)?;
                PassOutcome::Aborted {
                    reason: err.to_string(),
                }
            }
        };

        let duration_ms = (chrono::Utc::now() - pass.started_at)
            .num_milliseconds()
            .max(0) as u64;
        let report = ReconciliationReport {
            pass_id: pass.id,
            started_at: pass.started_at,
            duration_ms,
            fetched: stats.fetched,
            removed: stats.removed,
            skipped: stats.skipped,
            failed: stats.failed,
            outcome,
        };
        info!(
            committed = report.committed(),
            partial = report.is_partial(),
            "pass finished: {}",
            report.summary()
        );
        Ok(report)
    }

    async fn execute_pass(
        &self,
        pass: &mut ReconciliationPass,
        stats: &mut PassStats,
        cancel: &CancellationToken,
    ) -> Result<PassOutcome> {
        // Planning: snapshot both sides, then a pure diff. Any failure here
        // aborts before any mutation.
        info!("Phase 1: reading catalog snapshot");
        let songs = self.catalog.list_songs().await?;
        info!(songs = songs.len(), "catalog snapshot read");

        info!("Phase 2: scanning working tree");
        let assets = scanner::scan(&self.layout).await?;
        info!(assets = assets.len(), "working tree scanned");

        let changeset = diff::plan(&songs, &assets);
        stats.skipped = changeset.skipped;
        info!(
            fetches = changeset.fetches.len(),
            removes = changeset.removes.len(),
            skipped = changeset.skipped,
            "changeset planned"
        );

        pass.advance(PassState::Executing)?;
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        // Staging leftovers from an interrupted pass are dead scratch state.
        // The executor re-creates per-song staging on demand, and anything
        // still lying here must never reach the commit gate.
        self.purge_staging().await?;

        // Removes first, sequentially. A failure escalates: prior removes
        // stay (they completed), nothing else is touched.
        info!("Phase 3: executing {} removes", changeset.removes.len());
        for op in &changeset.removes {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            tokio::fs::remove_dir_all(&op.path)
                .await
                .map_err(|source| SyncError::Remove {
                    song_id: op.song_id.clone(),
                    source,
                })?;
            stats.removed += 1;
            info!(song_id = %op.song_id, "removed asset");
        }

        // Fetches across the bounded pool. Per-item isolation: failures are
        // collected, never allowed to abort sibling operations.
        info!("Phase 4: executing {} fetches", changeset.fetches.len());
        self.execute_fetches(&changeset, stats, cancel).await;

        pass.advance(PassState::Evaluating)?;
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        if !stats.failed.is_empty() {
            warn!(
                failed = stats.failed.len(),
                "pass is partial, committing the successful subset"
            );
        }

        // Commit even when the changeset was empty: a previous pass may have
        // left staged-but-uncommitted assets behind, and the sink is the one
        // who knows whether the tree is actually clean.
        pass.advance(PassState::Committing)?;
        info!("Phase 5: commit gate");
        let outcome = self
            .gate
            .commit(
                &self.layout,
                stats.fetched,
                stats.removed,
                stats.skipped,
                &stats.failed,
            )
            .await?;

        Ok(match outcome {
            CommitOutcome::Committed { revision } if stats.failed.is_empty() => {
                PassOutcome::Committed { revision }
            }
            CommitOutcome::Committed { revision } => PassOutcome::CommittedPartial { revision },
            CommitOutcome::NothingToCommit if stats.failed.is_empty() => PassOutcome::NoChanges,
            // Every planned fetch failed and nothing else changed: there is
            // no commit, but the pass is still partial so callers re-trigger.
            CommitOutcome::NothingToCommit => PassOutcome::CommittedPartial { revision: None },
        })
    }

    /// Drop the whole staging root. Called before mutation begins so that
    /// half-written leftovers from a killed pass can never be staged into a
    /// commit, not even when their song left the catalog or keeps failing.
    async fn purge_staging(&self) -> Result<()> {
        let staging = self.layout.staging_root();
        match tokio::fs::remove_dir_all(&staging).await {
            Ok(()) => {
                info!("cleared stale staging leftovers");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SyncError::Scan {
                path: staging,
                source,
            }),
        }
    }

    async fn execute_fetches(
        &self,
        changeset: &ChangeSet,
        stats: &mut PassStats,
        cancel: &CancellationToken,
    ) {
        let results: Vec<_> = stream::iter(changeset.fetches.iter())
            .map(|song| {
                let cancel = cancel.clone();
                async move { self.executor.fetch(song, &cancel).await }
            })
            .buffer_unordered(self.config.max_concurrent_fetches.max(1))
            .collect()
            .await;

        for result in results {
            match result {
                Ok(fetched) => {
                    stats.fetched += 1;
                    info!(
                        song_id = %fetched.song_id,
                        audio_file = fetched.audio_file,
                        bytes = fetched.bytes_written,
                        "fetched asset"
                    );
                }
                Err(failure) => {
                    warn!(
                        song_id = %failure.song_id,
                        attempts = failure.attempts,
                        "fetch failed: {}",
                        failure.reason
                    );
                    stats.failed.push(FailedFetch {
                        song_id: failure.song_id,
                        reason: failure.reason,
                        attempts: failure.attempts,
                    });
                }
            }
        }
    }
}
