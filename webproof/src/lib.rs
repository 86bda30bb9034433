//! Web Proof provider integration.
//!
//! Three concerns, deliberately kept free of flow control:
//! 1. **Request building**: construct the provider redirect URL for a
//!    verification attempt (pure, no I/O).
//! 2. **Proof lookup**: fetch a generated proof by request id over HTTP.
//! 3. **Income extraction**: map a retrieved proof payload to a discrete
//!    income bucket.
//!
//! The polling loop that drives lookups lives in `creditline-flow`; this
//! crate only answers single questions.

pub mod builder;
pub mod client;
pub mod error;
pub mod extract;
pub mod payload;

pub use builder::{parse_return_params, BuilderConfig, RequestBuilder, StartedRequest};
pub use client::{ProofSource, VouchClient};
pub use error::WebProofError;
pub use extract::{estimate_income, income_bucket, Estimate};
pub use payload::ProofPayload;
