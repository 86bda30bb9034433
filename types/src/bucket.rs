//! Discrete income buckets.
//!
//! A bucket is a coarse income tier used to size a credit limit without
//! exposing exact financial figures on-chain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A discretized monthly-income tier, in whole monetary units.
///
/// Values come from the fixed ordered threshold set; `from_estimate` is the
/// only constructor the flow uses, so a bucket is always one of the
/// configured tiers or zero.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct IncomeBucket(u64);

impl IncomeBucket {
    /// The below-all-thresholds bucket.
    pub const ZERO: Self = Self(0);

    /// Default ordered thresholds: {500, 1000, 2000} monetary units.
    pub const DEFAULT_THRESHOLDS: [u64; 3] = [500, 1_000, 2_000];

    /// Bucket an income estimate: the largest threshold not exceeding the
    /// estimate, or zero if the estimate is below every threshold.
    ///
    /// `thresholds` must be in ascending order (they are validated in
    /// `FlowParams`, and the default set is ascending by construction).
    pub fn from_estimate(estimate: f64, thresholds: &[u64; 3]) -> Self {
        let mut bucket = Self::ZERO;
        for &t in thresholds {
            if estimate >= t as f64 {
                bucket = Self(t);
            }
        }
        bucket
    }

    /// The bucket value as whole monetary units (the integer the contract
    /// call carries).
    pub fn as_units(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for IncomeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
