use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// The gateway could not be reached or answered unusably.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// The gateway or contract rejected the submission.
    #[error("submission rejected: {0}")]
    Rejected(String),

    /// The transaction was submitted but confirmation never arrived
    /// within the poll budget. The transaction may still land; the caller
    /// decides what to tell the user. No automatic resubmission.
    #[error("transaction {tx_hash} unconfirmed after {polls} status checks")]
    ConfirmationTimeout { tx_hash: String, polls: u32 },
}
