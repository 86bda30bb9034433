//! HTTP client for fetching generated proofs from the provider.

use crate::error::WebProofError;
use crate::payload::ProofPayload;
use creditline_types::RequestId;

use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// Default base URL of the provider's proof API.
const DEFAULT_API_BASE: &str = "https://api.getvouch.io";

/// Default timeout for proof lookups.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Something that can answer "is the proof for this request ready yet?".
///
/// The polling loop is written against this seam so it can be driven by a
/// stub in tests and by [`VouchClient`] in production.
pub trait ProofSource {
    /// Fetch the proof for a request, if the provider has finished
    /// generating it. `Ok(None)` means not ready yet.
    fn fetch_proof(
        &self,
        id: &RequestId,
    ) -> impl Future<Output = Result<Option<ProofPayload>, WebProofError>> + Send;
}

/// Raw JSON response from the provider's proof endpoint.
///
/// The API contract: `GET /proofs/{requestId}` returns either
/// `{"status": "pending"}` while the proof is being generated, or
/// `{"status": "ready", "proof": {...}}` once it exists.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    proof: Option<ProofPayload>,
}

/// HTTP client for the Web Proof provider's lookup API.
pub struct VouchClient {
    /// Reusable HTTP client (connection pool).
    http: reqwest::Client,
    /// Base URL of the proof API.
    api_base: String,
}

impl VouchClient {
    /// Create a client pointing at the provider's production API.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    /// Create a client pointing at a custom API base URL.
    pub fn with_base_url(api_base: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn proof_url(&self, id: &RequestId) -> String {
        format!("{}/proofs/{}", self.api_base, id)
    }
}

impl Default for VouchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofSource for VouchClient {
    async fn fetch_proof(
        &self,
        id: &RequestId,
    ) -> Result<Option<ProofPayload>, WebProofError> {
        let url = self.proof_url(id);

        let response = self.http.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                WebProofError::Transport(format!("lookup timed out: {e}"))
            } else if e.is_connect() {
                WebProofError::Transport(format!("connection failed: {e}"))
            } else {
                WebProofError::Transport(e.to_string())
            }
        })?;

        // The provider answers 404 until the proof exists.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(WebProofError::Transport(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let lookup: LookupResponse = response.json().await.map_err(|e| {
            WebProofError::InvalidResponse(format!("failed to parse lookup response: {e}"))
        })?;

        match lookup {
            LookupResponse {
                proof: Some(payload),
                ..
            } => {
                tracing::debug!(request_id = %id, "proof ready");
                Ok(Some(payload))
            }
            LookupResponse { status, .. } => {
                tracing::trace!(request_id = %id, status = ?status, "proof not ready");
                Ok(None)
            }
        }
    }
}
