//! Verification request identity, provider selection, and lifecycle status.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque unique identifier for one verification attempt.
///
/// Freshly created requests get a random v4 UUID in canonical hyphenated
/// form. Identifiers arriving back from a provider redirect are treated as
/// opaque tokens and are not required to be UUIDs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh request id.
    ///
    /// Uniqueness within the process lifetime is what the flow relies on;
    /// a v4 UUID makes collisions cryptographically negligible.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an identifier received from elsewhere (e.g. a redirect query).
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A supported Web Proof provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// Binance: proof of exchange balance.
    Binance,
    /// Wise: proof of a received transaction.
    Wise,
}

impl Provider {
    /// Datasource template id for Binance proof-of-balance.
    pub const BINANCE_BALANCE_DATASOURCE: &'static str =
        "a3d15595-76f0-4e2f-9fbb-e98bcbe2782a";

    /// Datasource template id for Wise proof-of-transaction.
    pub const WISE_TRANSACTION_DATASOURCE: &'static str =
        "736ba397-e3dc-428d-b2f7-6bac03523edd";

    /// Short tag carried in redirect query strings (`vouch=<tag>`).
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::Wise => "wise",
        }
    }

    /// Parse the redirect query tag back into a provider.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "binance" => Some(Self::Binance),
            "wise" => Some(Self::Wise),
            _ => None,
        }
    }

    /// The provider-fixed datasource template this flow proves against.
    pub fn datasource_id(&self) -> &'static str {
        match self {
            Self::Binance => Self::BINANCE_BALANCE_DATASOURCE,
            Self::Wise => Self::WISE_TRANSACTION_DATASOURCE,
        }
    }

    /// Whether this provider's datasource takes a currency input.
    pub fn requires_currency(&self) -> bool {
        matches!(self, Self::Binance)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Lifecycle status of a verification request.
///
/// Mutated only by the polling loop and user cancellation. `TimedOut` is a
/// resting state, not a resolution: the user chooses to resume polling or
/// abandon from there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Built, not yet handed to a browsing context.
    Created,
    /// Redirect launched; waiting for the user to finish with the provider.
    AwaitingRedirectCompletion,
    /// Actively polling the provider for the proof.
    Polling,
    /// Proof retrieved and the on-chain commitment confirmed.
    Succeeded,
    /// Poll attempt budget exhausted; resumable.
    TimedOut,
    /// Abandoned by the user.
    Cancelled,
    /// Submission failed; the whole flow must be restarted.
    Failed,
}

impl RequestStatus {
    /// Whether the request has reached a resolution no transition leaves.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Cancelled | Self::Failed)
    }

    /// Whether the caller may still act on this request (retry the
    /// redirect, resume polling, or cancel).
    pub fn is_resumable(&self) -> bool {
        !self.is_resolved()
    }
}

/// One verification attempt, from construction to resolution.
///
/// Not persisted beyond process memory; the lifetime is a single attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub id: RequestId,
    pub provider: Provider,
    pub created_at: Timestamp,
    pub status: RequestStatus,
}

impl VerificationRequest {
    /// Create a request in the `Created` state with a fresh id.
    pub fn new(provider: Provider, now: Timestamp) -> Self {
        Self {
            id: RequestId::generate(),
            provider,
            created_at: now,
            status: RequestStatus::Created,
        }
    }

    /// Adopt a request id arriving back from a provider redirect.
    pub fn resumed(id: RequestId, provider: Provider, now: Timestamp) -> Self {
        Self {
            id,
            provider,
            created_at: now,
            status: RequestStatus::Polling,
        }
    }
}
