//! The verification flow.
//!
//! Control flow: request builder → redirect dispatcher → proof polling loop
//! → (on success) income extraction → on-chain submission.
//!
//! The polling loop is an explicit finite-state machine with pure
//! transition functions ([`poll::PollMachine`]) interpreted by an async
//! driver ([`driver::PollDriver`]); the [`orchestrator::FlowEngine`] wires
//! all five steps together and emits events for the host to render.

pub mod driver;
pub mod error;
pub mod orchestrator;
pub mod poll;

pub use driver::{PollDriver, PollOutcome};
pub use error::FlowError;
pub use orchestrator::{CancelHandle, FlowEngine, FlowEvent};
pub use poll::{PollEffect, PollInput, PollMachine, PollState};
