//! Shared utilities for the creditline flow.

pub mod logging;

pub use logging::init_tracing;
