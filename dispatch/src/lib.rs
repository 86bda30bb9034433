//! External redirect dispatcher.
//!
//! Opening a verification URL depends on what the host environment offers:
//! a windowed browsing context, an embedded in-app browser, or only the
//! operating system's default handler. The dispatcher does not probe the
//! host; it is handed an ordered list of [`LaunchStrategy`] implementations
//! and walks them until one reports the URL opened.
//!
//! The dispatcher specifies *that* a launch happens, not *how*; hosts plug
//! in the strategies their environment supports.

pub mod error;
pub mod strategy;

pub use error::DispatchError;
pub use strategy::{strategy_fn, FnStrategy, LaunchOutcome, LaunchStrategy, SystemHandler};

/// Tries launch strategies in priority order until one opens the URL.
///
/// Explicitly constructed with its strategies; no global dispatcher state.
pub struct RedirectDispatcher {
    strategies: Vec<Box<dyn LaunchStrategy>>,
}

impl RedirectDispatcher {
    /// Build a dispatcher from strategies in descending priority order.
    pub fn new(strategies: Vec<Box<dyn LaunchStrategy>>) -> Self {
        Self { strategies }
    }

    /// A dispatcher that only delegates to the operating system's default
    /// handler, the right choice for a terminal host.
    pub fn system_only() -> Self {
        Self::new(vec![Box::new(SystemHandler)])
    }

    /// Open the URL with the first strategy that succeeds.
    ///
    /// A strategy reporting [`LaunchOutcome::Blocked`] (e.g. a popup
    /// blocker closed the auxiliary window) falls through to the next
    /// strategy, as does a strategy that fails outright. Returns the name
    /// of the strategy that opened the URL.
    pub fn dispatch(&self, url: &str) -> Result<&'static str, DispatchError> {
        if self.strategies.is_empty() {
            return Err(DispatchError::NoStrategies);
        }

        let mut attempts = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            match strategy.launch(url) {
                Ok(LaunchOutcome::Opened) => {
                    tracing::info!(strategy = strategy.name(), "verification url opened");
                    return Ok(strategy.name());
                }
                Ok(LaunchOutcome::Blocked) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        "launch blocked, falling back"
                    );
                    attempts.push(format!("{}: blocked", strategy.name()));
                }
                Err(e) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "launch failed, falling back"
                    );
                    attempts.push(format!("{}: {e}", strategy.name()));
                }
            }
        }

        Err(DispatchError::AllStrategiesFailed {
            attempts: attempts.join("; "),
        })
    }
}
