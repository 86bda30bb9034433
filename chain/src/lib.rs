//! On-chain submission of income commitments.
//!
//! The contract surface is a single state-mutating call taking (user
//! address, integer income bucket, 32-byte proof hash), with success
//! indicated by transaction confirmation. Submission is never retried
//! automatically: a financial transaction that failed must be surfaced to
//! the user verbatim, not silently resubmitted.

pub mod error;
pub mod gateway;
pub mod receipt;

pub use error::ChainError;
pub use gateway::{submit_and_confirm, ChainGateway, VerifierGateway};
pub use receipt::SubmissionReceipt;
