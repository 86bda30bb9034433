//! Launch strategies.
//!
//! The priority order a host typically wires up:
//! 1. auxiliary window / new tab (windowed hosts),
//! 2. navigating the current context (when the auxiliary window is blocked),
//! 3. embedded full-screen in-app browser (native/mobile hosts),
//! 4. the operating system's default handler.
//!
//! Strategies 1–3 exist only inside a concrete host shell, so hosts inject
//! them via [`strategy_fn`]; this crate ships [`SystemHandler`] for 4.

use crate::error::DispatchError;

/// What a launch attempt reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The URL is open in some browsing context.
    Opened,
    /// The host refused the launch (popup blocked, context immediately
    /// closed). The dispatcher falls back to the next strategy.
    Blocked,
}

/// A pluggable way of putting a URL in front of the user.
pub trait LaunchStrategy: Send + Sync {
    /// Human-readable name of this strategy, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Attempt to open the URL.
    fn launch(&self, url: &str) -> Result<LaunchOutcome, DispatchError>;
}

/// A strategy defined by a closure: how hosts inject their windowed or
/// embedded browsing contexts, and how tests script outcomes.
pub struct FnStrategy<F> {
    name: &'static str,
    launch: F,
}

/// Build a [`LaunchStrategy`] from a name and a closure.
pub fn strategy_fn<F>(name: &'static str, launch: F) -> FnStrategy<F>
where
    F: Fn(&str) -> Result<LaunchOutcome, DispatchError> + Send + Sync,
{
    FnStrategy { name, launch }
}

impl<F> LaunchStrategy for FnStrategy<F>
where
    F: Fn(&str) -> Result<LaunchOutcome, DispatchError> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn launch(&self, url: &str) -> Result<LaunchOutcome, DispatchError> {
        (self.launch)(url)
    }
}

/// Delegate the URL to the operating system's default handler.
///
/// The last-resort strategy: works from any process that can spawn the
/// platform opener, with no browsing context of its own.
pub struct SystemHandler;

impl SystemHandler {
    #[cfg(target_os = "linux")]
    const OPENER: (&'static str, &'static [&'static str]) = ("xdg-open", &[]);
    #[cfg(target_os = "macos")]
    const OPENER: (&'static str, &'static [&'static str]) = ("open", &[]);
    #[cfg(target_os = "windows")]
    const OPENER: (&'static str, &'static [&'static str]) = ("cmd", &["/C", "start", ""]);
}

impl LaunchStrategy for SystemHandler {
    fn name(&self) -> &'static str {
        "system-handler"
    }

    fn launch(&self, url: &str) -> Result<LaunchOutcome, DispatchError> {
        let (program, args) = Self::OPENER;
        std::process::Command::new(program)
            .args(args)
            .arg(url)
            .spawn()
            .map_err(|e| DispatchError::LaunchFailed {
                strategy: self.name(),
                reason: e.to_string(),
            })?;
        Ok(LaunchOutcome::Opened)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_strategy_reports_its_name() {
        let s = strategy_fn("aux-window", |_| Ok(LaunchOutcome::Opened));
        assert_eq!(s.name(), "aux-window");
    }

    #[test]
    fn fn_strategy_passes_url_through() {
        let s = strategy_fn("echo", |url: &str| {
            assert_eq!(url, "https://example.com");
            Ok(LaunchOutcome::Opened)
        });
        assert_eq!(s.launch("https://example.com").unwrap(), LaunchOutcome::Opened);
    }

    #[test]
    fn system_handler_has_stable_name() {
        assert_eq!(SystemHandler.name(), "system-handler");
    }
}
