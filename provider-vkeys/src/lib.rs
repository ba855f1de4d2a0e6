//! # vkeys Download Provider
//!
//! Implements `TrackProvider` against the vkeys music API. One
//! `fetch_track` call runs the whole provider-side flow:
//!
//! 1. search the normalized "artist title" term and take the first hit
//! 2. resolve the hit's download URL and container format via `/geturl`
//! 3. look up LRC and translated lyric bodies via `/lyric` (best effort)
//! 4. download the audio bytes
//!
//! The connector classifies failures (`RateLimited`, `Transient`,
//! `NotFound`, `Malformed`) and never retries; backoff belongs to the
//! fetch executor.

pub mod connector;
pub mod types;

pub use connector::{MatchPolicy, VkeysConfig, VkeysConnector};
