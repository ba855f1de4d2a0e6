//! # Seam Traits
//!
//! Boundary traits and wire-level types shared by the reconciliation engine
//! and its external collaborators:
//!
//! - **Catalog** (`catalog`): read-only snapshot of the desired song list
//! - **Provider** (`provider`): audio + lyrics download for one song
//! - **Version control** (`vcs`): stage the working tree and produce one commit
//! - **Retry** (`retry`): shared backoff policy for unreliable calls
//!
//! Every trait is object-safe and consumed as `Arc<dyn Trait>`, so tests can
//! substitute in-memory fakes without touching the network or a real
//! repository.

pub mod catalog;
pub mod provider;
pub mod retry;
pub mod vcs;

pub use catalog::{CatalogError, CatalogSource, Song, SongId};
pub use provider::{ProviderError, TrackBundle, TrackProvider, TrackQuery};
pub use retry::RetryPolicy;
pub use vcs::{CommitError, CommitOutcome, CommitSink};
