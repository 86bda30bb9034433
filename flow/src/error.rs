use creditline_chain::ChainError;
use creditline_dispatch::DispatchError;
use creditline_webproof::WebProofError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    /// Bad or missing setup. Fatal to the whole flow, reported immediately.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The redirect could not be launched. Recoverable: the request stays
    /// in `Created` and the caller may retry.
    #[error(transparent)]
    Redirect(#[from] DispatchError),

    /// The on-chain submission failed. Fatal to the attempt, surfaced
    /// verbatim, never retried automatically.
    #[error(transparent)]
    Submission(#[from] ChainError),

    /// An operation was invoked in a state that does not allow it.
    #[error("flow is in state {actual}, cannot {operation}")]
    InvalidState {
        operation: &'static str,
        actual: String,
    },
}

impl From<WebProofError> for FlowError {
    fn from(e: WebProofError) -> Self {
        match e {
            WebProofError::Configuration(msg) => Self::Configuration(msg),
            // Lookup transport problems are absorbed by the polling loop
            // and never reach here; anything else that does is a setup
            // problem from the flow's point of view.
            other => Self::Configuration(other.to_string()),
        }
    }
}
