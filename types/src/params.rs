//! Flow parameters: every tunable of the verification lifecycle.

use crate::bucket::IncomeBucket;
use serde::{Deserialize, Serialize};

/// Tunable parameters for one verification flow.
///
/// Constructed once and passed by reference to the components that need
/// them; there is no process-wide parameter state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowParams {
    // ── Polling ──────────────────────────────────────────────────────────
    /// Delay between proof lookups, in seconds. Contract: 3.
    pub poll_interval_secs: u64,

    /// Lookups issued before the loop times out and asks the user whether
    /// to keep waiting. Contract: exactly 20.
    pub max_poll_attempts: u32,

    // ── Income extraction ────────────────────────────────────────────────
    /// Fraction of an exchange balance treated as monthly income, in basis
    /// points. Default 1000 (10%), an unverified heuristic carried from
    /// the source behavior, kept overridable rather than second-guessed.
    pub income_multiplier_bps: u32,

    /// Ascending bucket thresholds in whole monetary units.
    pub bucket_thresholds: [u64; 3],

    // ── Confirmation wait ────────────────────────────────────────────────
    /// Delay between transaction status checks, in seconds.
    pub confirmation_poll_interval_secs: u64,

    /// Status checks before the confirmation wait gives up.
    pub max_confirmation_polls: u32,
}

impl FlowParams {
    /// The intended production configuration.
    pub fn defaults() -> Self {
        Self {
            poll_interval_secs: 3,
            max_poll_attempts: 20,
            income_multiplier_bps: 1_000,
            bucket_thresholds: IncomeBucket::DEFAULT_THRESHOLDS,
            confirmation_poll_interval_secs: 2,
            max_confirmation_polls: 30,
        }
    }

    /// Whether the threshold set is strictly ascending.
    pub fn thresholds_ascending(&self) -> bool {
        self.bucket_thresholds.windows(2).all(|w| w[0] < w[1])
    }
}

impl Default for FlowParams {
    fn default() -> Self {
        Self::defaults()
    }
}
