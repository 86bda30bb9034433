//! Gateway client for the income verifier contract.

use crate::error::ChainError;
use crate::receipt::SubmissionReceipt;
use creditline_types::{ChainAddress, FlowParams, IncomeBucket, NetworkConfig, ProofHash};

use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// The contract call surface the flow needs, as a seam for tests.
pub trait ChainGateway {
    /// Submit the income commitment: (user address, bucket, proof hash).
    /// Returns the transaction hash. Called exactly once per attempt.
    fn submit_income_proof(
        &self,
        user: &ChainAddress,
        bucket: IncomeBucket,
        proof_hash: &ProofHash,
    ) -> impl Future<Output = Result<String, ChainError>> + Send;

    /// Whether the network has confirmed the transaction yet.
    fn transaction_confirmed(
        &self,
        tx_hash: &str,
    ) -> impl Future<Output = Result<bool, ChainError>> + Send;
}

/// Submit once, then poll for confirmation.
///
/// The submission itself is never repeated; only the read-only status
/// check loops. Exhausting the confirmation budget is an error the caller
/// surfaces verbatim.
pub async fn submit_and_confirm<G: ChainGateway + Sync>(
    gateway: &G,
    params: &FlowParams,
    user: &ChainAddress,
    bucket: IncomeBucket,
    proof_hash: &ProofHash,
) -> Result<SubmissionReceipt, ChainError> {
    let tx_hash = gateway.submit_income_proof(user, bucket, proof_hash).await?;
    tracing::info!(%tx_hash, bucket = %bucket, "income commitment submitted");

    for poll in 0..params.max_confirmation_polls {
        if gateway.transaction_confirmed(&tx_hash).await? {
            tracing::info!(%tx_hash, "transaction confirmed");
            return Ok(SubmissionReceipt::confirmed(tx_hash));
        }
        if poll + 1 < params.max_confirmation_polls {
            tokio::time::sleep(Duration::from_secs(params.confirmation_poll_interval_secs))
                .await;
        }
    }

    Err(ChainError::ConfirmationTimeout {
        tx_hash,
        polls: params.max_confirmation_polls,
    })
}

// ── VerifierGateway ─────────────────────────────────────────────────────

/// Default timeout for gateway requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the submission gateway.
///
/// Wraps `reqwest::Client` with the gateway's base URL and provides typed
/// methods for each action the flow needs. The gateway holds the signing
/// wallet; this client never touches credentials.
#[derive(Clone)]
pub struct VerifierGateway {
    http: reqwest::Client,
    gateway_url: String,
    verifier_contract: String,
}

impl VerifierGateway {
    /// Create a gateway client for the given network.
    pub fn new(network: &NetworkConfig) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ChainError::Gateway(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            gateway_url: network.gateway_url.clone(),
            verifier_contract: network.verifier_contract.clone(),
        })
    }

    /// The configured gateway URL.
    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    /// Send an action-tagged request and return the `result` field.
    async fn gateway_call(
        &self,
        action: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError> {
        let mut body = params;
        body.as_object_mut()
            .ok_or_else(|| ChainError::Gateway("params must be a JSON object".into()))?
            .insert("action".to_string(), serde_json::json!(action));

        let response = self
            .http
            .post(&self.gateway_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Gateway(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ChainError::Gateway(format!(
                "gateway returned HTTP {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChainError::Gateway(format!("invalid JSON response: {e}")))?;

        if let Some(err) = json.get("error").and_then(|e| e.as_str()) {
            return Err(ChainError::Rejected(err.to_string()));
        }

        Ok(json.get("result").cloned().unwrap_or(json))
    }
}

/// Response from the `submit_income_proof` action.
#[derive(Debug, Clone, Deserialize)]
struct SubmitResult {
    tx_hash: String,
    accepted: bool,
    #[serde(default)]
    detail: Option<String>,
}

/// Response from the `transaction_status` action.
#[derive(Debug, Clone, Deserialize)]
struct StatusResult {
    confirmed: bool,
    #[serde(default)]
    failed: bool,
    #[serde(default)]
    detail: Option<String>,
}

impl ChainGateway for VerifierGateway {
    async fn submit_income_proof(
        &self,
        user: &ChainAddress,
        bucket: IncomeBucket,
        proof_hash: &ProofHash,
    ) -> Result<String, ChainError> {
        let result = self
            .gateway_call(
                "submit_income_proof",
                serde_json::json!({
                    "contract": self.verifier_contract,
                    "user": user.as_str(),
                    "income_bucket": bucket.as_units(),
                    "proof_hash": proof_hash.to_prefixed_hex(),
                }),
            )
            .await?;

        let submit: SubmitResult = serde_json::from_value(result)
            .map_err(|e| ChainError::Gateway(format!("invalid submit response: {e}")))?;

        if !submit.accepted {
            return Err(ChainError::Rejected(
                submit.detail.unwrap_or_else(|| "submission not accepted".into()),
            ));
        }
        Ok(submit.tx_hash)
    }

    async fn transaction_confirmed(&self, tx_hash: &str) -> Result<bool, ChainError> {
        let result = self
            .gateway_call(
                "transaction_status",
                serde_json::json!({ "tx_hash": tx_hash }),
            )
            .await?;

        let status: StatusResult = serde_json::from_value(result)
            .map_err(|e| ChainError::Gateway(format!("invalid status response: {e}")))?;

        if status.failed {
            return Err(ChainError::Rejected(
                status.detail.unwrap_or_else(|| "transaction failed".into()),
            ));
        }
        Ok(status.confirmed)
    }
}
