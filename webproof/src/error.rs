use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebProofError {
    /// Bad or missing setup. Fatal to the whole flow.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A lookup could not reach the provider. The polling loop treats
    /// this the same as a not-ready result.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with something we could not interpret.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
