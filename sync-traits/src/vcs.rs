//! Version Control Abstraction
//!
//! The engine's only contract with version control: stage everything under
//! the working tree root and produce exactly one commit, or fail as a whole.
//! Commit mechanics (git, push targets, auth) live behind this seam.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Result of a successful commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// One commit was produced (and pushed, where the sink pushes).
    Committed {
        /// Revision identifier, when the backend exposes one.
        revision: Option<String>,
    },
    /// Staging found no changes; no commit was produced.
    NothingToCommit,
}

#[derive(Error, Debug)]
pub enum CommitError {
    /// The backend rejected the commit or push (e.g. a non-fast-forward
    /// push conflict). Staged local state is preserved for the next pass.
    #[error("commit rejected: {0}")]
    Rejected(String),

    #[error("version control tool failed: {0}")]
    Tool(String),

    #[error("io error during commit: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces one atomic commit of the working tree, or fails entirely.
#[async_trait]
pub trait CommitSink: Send + Sync {
    /// Stage every change under `root` and commit with `message`.
    ///
    /// Must be all-or-nothing: either one commit representing the full
    /// staged state, or an error with no commit produced.
    async fn commit_all(&self, root: &Path, message: &str) -> Result<CommitOutcome, CommitError>;
}
