//! Proof payload model.

use creditline_types::ProofHash;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An opaque provider-returned proof.
///
/// At minimum one numeric field is expected (`balance` for balance proofs,
/// `amount` for transaction proofs); anything else the provider attaches is
/// preserved untouched in `metadata`. Owned by the polling loop once
/// fetched and never mutated after retrieval.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProofPayload {
    /// Exchange balance, for balance-based proofs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,

    /// Transaction amount, for transaction-based proofs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    /// Everything else the provider returned.
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ProofPayload {
    /// SHA-256 over the canonical JSON serialization of the full payload.
    ///
    /// This is the 32-byte commitment the contract call carries.
    pub fn content_hash(&self) -> ProofHash {
        let encoded =
            serde_json::to_vec(self).expect("proof payload is always serializable to JSON");
        let digest = Sha256::digest(&encoded);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        ProofHash::new(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_balance_proof() {
        let payload: ProofPayload = serde_json::from_str(r#"{"balance": 15000}"#).unwrap();
        assert_eq!(payload.balance, Some(15000.0));
        assert_eq!(payload.amount, None);
    }

    #[test]
    fn deserializes_empty_object() {
        let payload: ProofPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.balance, None);
        assert_eq!(payload.amount, None);
        assert!(payload.metadata.is_empty());
    }

    #[test]
    fn unknown_fields_land_in_metadata() {
        let payload: ProofPayload =
            serde_json::from_str(r#"{"amount": 800, "currency": "EUR"}"#).unwrap();
        assert_eq!(payload.amount, Some(800.0));
        assert_eq!(
            payload.metadata.get("currency").and_then(|v| v.as_str()),
            Some("EUR")
        );
    }

    #[test]
    fn content_hash_is_deterministic() {
        let payload: ProofPayload = serde_json::from_str(r#"{"balance": 1}"#).unwrap();
        assert_eq!(payload.content_hash(), payload.content_hash());
        assert!(!payload.content_hash().is_zero());
    }

    #[test]
    fn content_hash_distinguishes_payloads() {
        let a: ProofPayload = serde_json::from_str(r#"{"balance": 1}"#).unwrap();
        let b: ProofPayload = serde_json::from_str(r#"{"balance": 2}"#).unwrap();
        assert_ne!(a.content_hash(), b.content_hash());
    }
}
