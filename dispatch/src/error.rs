use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// One strategy could not launch the URL.
    #[error("launch via {strategy} failed: {reason}")]
    LaunchFailed {
        strategy: &'static str,
        reason: String,
    },

    /// Every configured strategy was tried and none opened the URL.
    /// Recoverable: the request stays retryable by the caller.
    #[error("no launch strategy could open the url ({attempts})")]
    AllStrategiesFailed { attempts: String },

    /// The dispatcher was constructed with no strategies at all.
    #[error("no launch strategies configured")]
    NoStrategies,
}
