//! Submission receipts.

use serde::{Deserialize, Serialize};

/// The durable record of a confirmed income commitment.
///
/// Immutable once confirmed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Hash of the submitted transaction.
    pub transaction_hash: String,
    /// Whether the network confirmed the transaction.
    pub confirmed: bool,
}

impl SubmissionReceipt {
    pub fn confirmed(transaction_hash: impl Into<String>) -> Self {
        Self {
            transaction_hash: transaction_hash.into(),
            confirmed: true,
        }
    }
}
