//! Git-backed commit sink.
//!
//! Shells out to the `git` binary in the archive root. The dirty check is
//! `git status --porcelain`, so staged-but-uncommitted leftovers from an
//! interrupted run are picked up by the next pass's commit.

use std::path::Path;
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use sync_traits::{CommitError, CommitOutcome, CommitSink};

pub struct GitCommitSink {
    push: bool,
}

impl GitCommitSink {
    pub fn new(push: bool) -> Self {
        Self { push }
    }

    async fn git(root: &Path, args: &[&str]) -> Result<Output, CommitError> {
        debug!(?args, "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(root)
            .output()
            .await?;
        if !output.status.success() {
            return Err(CommitError::Tool(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output)
    }
}

#[async_trait]
impl CommitSink for GitCommitSink {
    async fn commit_all(&self, root: &Path, message: &str) -> Result<CommitOutcome, CommitError> {
        let status = Self::git(root, &["status", "--porcelain"]).await?;
        if status.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(CommitOutcome::NothingToCommit);
        }

        Self::git(root, &["add", "-A"]).await?;
        Self::git(root, &["commit", "-m", message]).await?;
        let revision = Self::git(root, &["rev-parse", "--short", "HEAD"])
            .await
            .ok()
            .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string());

        if self.push {
            let output = Command::new("git")
                .args(["push"])
                .current_dir(root)
                .output()
                .await?;
            if !output.status.success() {
                return Err(CommitError::Rejected(
                    String::from_utf8_lossy(&output.stderr).trim().to_string(),
                ));
            }
            info!(revision = revision.as_deref().unwrap_or("?"), "pushed");
        }

        Ok(CommitOutcome::Committed { revision })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn run(root: &Path, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(root)
            .output()
            .await
            .unwrap();
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    async fn init_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        run(dir.path(), &["init", "-q"]).await;
        run(dir.path(), &["config", "user.email", "sync@localhost"]).await;
        run(dir.path(), &["config", "user.name", "tunesync"]).await;
        dir
    }

    #[tokio::test]
    async fn commits_dirty_tree_then_reports_clean_tree() {
        let dir = init_repo().await;
        tokio::fs::write(dir.path().join("a.txt"), b"hello")
            .await
            .unwrap();

        let sink = GitCommitSink::new(false);
        let outcome = sink
            .commit_all(dir.path(), "sync: 1 fetched, 0 removed, 0 up to date")
            .await
            .unwrap();
        match outcome {
            CommitOutcome::Committed { revision } => assert!(revision.is_some()),
            other => panic!("expected Committed, got {other:?}"),
        }

        let second = sink.commit_all(dir.path(), "noop").await.unwrap();
        assert!(matches!(second, CommitOutcome::NothingToCommit));
    }

    #[tokio::test]
    async fn push_without_remote_is_a_rejection() {
        let dir = init_repo().await;
        tokio::fs::write(dir.path().join("a.txt"), b"hello")
            .await
            .unwrap();

        let sink = GitCommitSink::new(true);
        let err = sink.commit_all(dir.path(), "sync").await.unwrap_err();
        assert!(matches!(err, CommitError::Rejected(_)), "got {err:?}");
    }
}
