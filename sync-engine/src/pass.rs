//! Pass State Machine & Reconciliation Report
//!
//! One reconciliation pass moves through a fixed set of validated states:
//!
//! ```text
//! Planning → Executing → Evaluating → Committing → Done
//!     ↓           ↓           ↓            ↓
//!     └───────────┴───────────┴────────→ Aborting → Done
//! ```
//!
//! `Aborting` is reached only from a fatal condition (unreadable catalog or
//! working tree, an unexpected remove failure, cancellation, commit failure)
//! and performs no further mutation. The `ReconciliationReport` is the
//! pass's terminal artifact and the unit exposed to external callers.

use crate::error::{Result, SyncError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sync_traits::SongId;
use uuid::Uuid;

/// Unique identifier for a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PassId(Uuid);

impl PassId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PassId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Phase of a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassState {
    Planning,
    Executing,
    Evaluating,
    Committing,
    Aborting,
    Done,
}

impl PassState {
    fn can_transition_to(self, next: PassState) -> bool {
        use PassState::*;
        matches!(
            (self, next),
            (Planning, Executing)
                | (Executing, Evaluating)
                | (Evaluating, Committing)
                | (Committing, Done)
                | (Planning, Aborting)
                | (Executing, Aborting)
                | (Evaluating, Aborting)
                | (Committing, Aborting)
                | (Aborting, Done)
        )
    }
}

impl std::fmt::Display for PassState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PassState::Planning => "planning",
            PassState::Executing => "executing",
            PassState::Evaluating => "evaluating",
            PassState::Committing => "committing",
            PassState::Aborting => "aborting",
            PassState::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// One in-flight reconciliation pass.
#[derive(Debug)]
pub struct ReconciliationPass {
    pub id: PassId,
    pub started_at: DateTime<Utc>,
    state: PassState,
}

impl ReconciliationPass {
    pub fn new() -> Self {
        Self {
            id: PassId::new(),
            started_at: Utc::now(),
            state: PassState::Planning,
        }
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    /// Move to the next state, rejecting transitions the machine does not
    /// allow.
    pub fn advance(&mut self, next: PassState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(SyncError::InvalidStateTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }

    /// Force the pass onto the abort path from any non-terminal state.
    pub fn abort(&mut self) {
        if self.state != PassState::Done {
            self.state = PassState::Aborting;
        }
    }
}

impl Default for ReconciliationPass {
    fn default() -> Self {
        Self::new()
    }
}

/// One fetch that failed permanently (including exhausted retries).
#[derive(Debug, Clone, Serialize)]
pub struct FailedFetch {
    pub song_id: SongId,
    pub reason: String,
    pub attempts: u32,
}

/// Terminal decision of a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PassOutcome {
    /// Every required operation succeeded and one commit was produced.
    Committed { revision: Option<String> },
    /// Some fetches failed permanently. The successful subset was committed;
    /// `revision` is `None` when that subset left nothing new to commit.
    CommittedPartial { revision: Option<String> },
    /// Nothing to do: the working tree already matched the catalog.
    NoChanges,
    /// Fatal condition; no commit was produced.
    Aborted { reason: String },
}

/// Aggregate of all operation outcomes for one pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub pass_id: PassId,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub fetched: u64,
    pub removed: u64,
    pub skipped: u64,
    pub failed: Vec<FailedFetch>,
    pub outcome: PassOutcome,
}

impl ReconciliationReport {
    /// Whether some operations failed permanently while the rest committed.
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn committed(&self) -> bool {
        matches!(
            self.outcome,
            PassOutcome::Committed { .. } | PassOutcome::CommittedPartial { .. }
        )
    }

    /// Human-readable one-pass summary, also embedded in commit messages.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} fetched, {} removed, {} up to date",
            self.fetched, self.removed, self.skipped
        );
        if !self.failed.is_empty() {
            out.push_str(&format!(", {} failed:", self.failed.len()));
            for failure in &self.failed {
                out.push_str(&format!(
                    "\n  - {}: {} ({} attempts)",
                    failure.song_id, failure.reason, failure.attempts
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_allowed() {
        let mut pass = ReconciliationPass::new();
        assert_eq!(pass.state(), PassState::Planning);
        pass.advance(PassState::Executing).unwrap();
        pass.advance(PassState::Evaluating).unwrap();
        pass.advance(PassState::Committing).unwrap();
        pass.advance(PassState::Done).unwrap();
    }

    #[test]
    fn aborting_is_reachable_from_every_active_state() {
        for reach in [0usize, 1, 2, 3] {
            let mut pass = ReconciliationPass::new();
            let path = [
                PassState::Executing,
                PassState::Evaluating,
                PassState::Committing,
            ];
            for state in path.iter().take(reach) {
                pass.advance(*state).unwrap();
            }
            pass.advance(PassState::Aborting).unwrap();
            pass.advance(PassState::Done).unwrap();
        }
    }

    #[test]
    fn skipping_states_is_rejected() {
        let mut pass = ReconciliationPass::new();
        let err = pass.advance(PassState::Committing).unwrap_err();
        assert!(matches!(err, SyncError::InvalidStateTransition { .. }));
        // Pass stays where it was.
        assert_eq!(pass.state(), PassState::Planning);
    }

    #[test]
    fn done_is_terminal() {
        let mut pass = ReconciliationPass::new();
        pass.advance(PassState::Executing).unwrap();
        pass.advance(PassState::Aborting).unwrap();
        pass.advance(PassState::Done).unwrap();
        assert!(pass.advance(PassState::Planning).is_err());
        assert!(pass.advance(PassState::Aborting).is_err());
    }

    fn report(failed: Vec<FailedFetch>, outcome: PassOutcome) -> ReconciliationReport {
        ReconciliationReport {
            pass_id: PassId::new(),
            started_at: Utc::now(),
            duration_ms: 10,
            fetched: 2,
            removed: 1,
            skipped: 3,
            failed,
            outcome,
        }
    }

    #[test]
    fn summary_enumerates_failures() {
        let r = report(
            vec![FailedFetch {
                song_id: SongId::new("5"),
                reason: "track not found for query 'X - A'".into(),
                attempts: 1,
            }],
            PassOutcome::CommittedPartial { revision: None },
        );
        let summary = r.summary();
        assert!(summary.starts_with("2 fetched, 1 removed, 3 up to date, 1 failed:"));
        assert!(summary.contains("- 5: track not found"));
        assert!(r.is_partial());
        assert!(r.committed());
    }

    #[test]
    fn full_success_summary_has_no_failure_section() {
        let r = report(vec![], PassOutcome::Committed { revision: None });
        assert_eq!(r.summary(), "2 fetched, 1 removed, 3 up to date");
        assert!(!r.is_partial());
    }

    #[test]
    fn aborted_report_is_not_committed() {
        let r = report(
            vec![],
            PassOutcome::Aborted {
                reason: "x".into(),
            },
        );
        assert!(!r.committed());
    }

    #[test]
    fn report_serializes_outcome_tag() {
        let r = report(vec![], PassOutcome::NoChanges);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"kind\":\"no_changes\""));
    }
}
