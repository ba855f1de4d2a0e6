//! # Reconciliation Engine
//!
//! Keeps a file-based music archive (audio + lyrics pairs) synchronized with
//! a declarative song catalog. The catalog is the source of truth; the
//! working tree is a materialized, idempotently rebuildable projection of it.
//!
//! ## Components
//!
//! - **Model** (`model`): content fingerprints and materialized assets
//! - **Layout** (`layout`): the on-disk contract shared by scanner and executor
//! - **Diff Engine** (`diff`): pure (desired, actual) → ordered changeset
//! - **Scanner** (`scanner`): enumerates materialized assets via sidecar markers
//! - **Fetch Executor** (`executor`): downloads with retry, staged atomic writes
//! - **Rate Gate** (`ratelimit`): pool-wide provider throttling
//! - **Pass** (`pass`): pass state machine and the reconciliation report
//! - **Commit Gate** (`commit`): one atomic commit per acceptable pass
//! - **Coordinator** (`coordinator`): drives a full pass end-to-end
//!
//! ## One pass
//!
//! ```rust,ignore
//! use sync_engine::{EngineConfig, Reconciler};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(reconciler: Reconciler) -> sync_engine::Result<()> {
//! let report = reconciler.run_pass(&CancellationToken::new()).await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod commit;
pub mod coordinator;
pub mod diff;
pub mod error;
pub mod executor;
pub mod layout;
pub mod model;
pub mod pass;
pub mod ratelimit;
pub mod scanner;

pub use coordinator::{EngineConfig, Reconciler};
pub use diff::{ChangeSet, RemoveOp};
pub use error::{Result, SyncError};
pub use layout::ArchiveLayout;
pub use model::{Asset, Fingerprint};
pub use pass::{FailedFetch, PassId, PassOutcome, PassState, ReconciliationReport};
pub use ratelimit::RateGate;
