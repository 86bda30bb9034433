//! Fundamental types for the creditline verification flow.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: request identifiers, providers, statuses, income buckets,
//! proof hashes, addresses, timestamps, and flow parameters.

pub mod address;
pub mod bucket;
pub mod error;
pub mod hash;
pub mod network;
pub mod params;
pub mod request;
pub mod time;

pub use address::ChainAddress;
pub use bucket::IncomeBucket;
pub use error::CreditError;
pub use hash::ProofHash;
pub use network::NetworkConfig;
pub use params::FlowParams;
pub use request::{Provider, RequestId, RequestStatus, VerificationRequest};
pub use time::Timestamp;
