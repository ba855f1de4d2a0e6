//! Pool-Wide Rate Gate
//!
//! The download provider's rate limits apply to the whole worker pool, not
//! to individual workers, so the gate is the one shared mutable resource
//! among fetch workers. Each call reserves the next available slot under a
//! short-lived lock and sleeps outside it; a rate-limit response pushes the
//! next slot forward for everyone.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
struct GateState {
    next_slot: Instant,
}

/// Shared provider throttle. Pass as an explicit `Arc<RateGate>` to every
/// fetch worker; never store it as ambient state.
#[derive(Debug)]
pub struct RateGate {
    state: Mutex<GateState>,
    min_interval: Duration,
}

impl RateGate {
    /// `min_interval` is the minimum spacing between provider calls across
    /// all workers.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            state: Mutex::new(GateState {
                next_slot: Instant::now(),
            }),
            min_interval,
        }
    }

    /// Wait for the next available provider slot.
    pub async fn admit(&self) {
        let wait = {
            let mut state = self.state.lock().expect("rate gate lock poisoned");
            let now = Instant::now();
            let slot = state.next_slot.max(now);
            state.next_slot = slot + self.min_interval;
            slot.saturating_duration_since(now)
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    /// Push the next slot forward after a rate-limit response. Applies to
    /// every worker, slowing the whole pool rather than one lane.
    pub fn penalize(&self, penalty: Duration) {
        let mut state = self.state.lock().expect("rate gate lock poisoned");
        let until = Instant::now() + penalty;
        if until > state.next_slot {
            debug!(penalty_ms = penalty.as_millis() as u64, "rate gate penalized");
            state.next_slot = until;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn admissions_are_spaced_by_min_interval() {
        let gate = RateGate::new(Duration::from_secs(2));
        let start = Instant::now();

        gate.admit().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        gate.admit().await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));

        gate.admit().await;
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn penalty_delays_every_subsequent_admission() {
        let gate = RateGate::new(Duration::from_millis(100));
        gate.admit().await;

        gate.penalize(Duration::from_secs(10));
        let start = Instant::now();
        gate.admit().await;
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn shorter_penalty_never_moves_the_slot_backwards() {
        let gate = RateGate::new(Duration::from_secs(5));
        gate.admit().await;
        gate.admit().await; // next slot now 10s out

        gate.penalize(Duration::from_secs(1));
        let start = Instant::now();
        gate.admit().await;
        // Still governed by the interval, not the weaker penalty.
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }
}
