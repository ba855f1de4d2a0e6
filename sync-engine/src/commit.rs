//! Commit Gate
//!
//! Produces exactly one atomic commit for a pass that reached `Committing`,
//! or fails the pass entirely. The commit message embeds the report summary
//! (counts plus the failing identifiers of a partial pass) for auditability.
//!
//! The gate is also invoked when the changeset was empty: after a commit
//! failure the working tree can hold staged-but-uncommitted assets that
//! re-diff as current, and the only way to resume is to let the sink stage
//! the tree and discover whether anything is left to commit. A clean tree
//! comes back as `NothingToCommit`, which suppresses the no-op commit.

use crate::layout::ArchiveLayout;
use crate::pass::FailedFetch;
use std::sync::Arc;
use sync_traits::{CommitError, CommitOutcome, CommitSink};
use tracing::info;

pub struct CommitGate {
    sink: Arc<dyn CommitSink>,
}

impl CommitGate {
    pub fn new(sink: Arc<dyn CommitSink>) -> Self {
        Self { sink }
    }

    /// Stage the working tree and produce one commit.
    pub async fn commit(
        &self,
        layout: &ArchiveLayout,
        fetched: u64,
        removed: u64,
        skipped: u64,
        failed: &[FailedFetch],
    ) -> Result<CommitOutcome, CommitError> {
        let message = commit_message(fetched, removed, skipped, failed);
        let outcome = self.sink.commit_all(layout.root(), &message).await?;
        match &outcome {
            CommitOutcome::Committed { revision } => {
                info!(revision = revision.as_deref().unwrap_or("unknown"), "committed pass");
            }
            CommitOutcome::NothingToCommit => {
                info!("working tree clean, commit suppressed");
            }
        }
        Ok(outcome)
    }
}

/// Build the commit message for one pass.
pub fn commit_message(fetched: u64, removed: u64, skipped: u64, failed: &[FailedFetch]) -> String {
    let mut message = format!("sync: {fetched} fetched, {removed} removed, {skipped} up to date");
    if !failed.is_empty() {
        message.push_str("\n\nPartial pass; failed songs:");
        for failure in failed {
            message.push_str(&format!(
                "\n- {}: {} ({} attempts)",
                failure.song_id, failure.reason, failure.attempts
            ));
        }
    }
    message
}
