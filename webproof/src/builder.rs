//! Verification request construction.
//!
//! Builds the provider redirect URL for a verification attempt. Pure
//! construction; no network calls are made here, and the only failure mode
//! is malformed configuration.

use crate::error::WebProofError;
use creditline_types::{Provider, RequestId};
use serde::{Deserialize, Serialize};

/// Default start URL of the Web Proof provider's hosted verification page.
const DEFAULT_START_URL: &str = "https://app.getvouch.io/start";

/// Return path on the application the provider redirects back to.
const RETURN_PATH: &str = "/credit";

/// Webhook path the provider may deliver proofs to (secure transport only).
const WEBHOOK_PATH: &str = "/api/vouch/webhook";

/// Static configuration the builder needs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Base URL of the provider's verification page.
    pub start_url: String,
    /// Customer/tenant identifier issued by the provider.
    pub customer_id: String,
    /// The application's own base URL (scheme matters: a webhook URL is
    /// only included when this is https, per provider requirement).
    pub app_url: String,
}

impl BuilderConfig {
    pub fn new(customer_id: impl Into<String>, app_url: impl Into<String>) -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            customer_id: customer_id.into(),
            app_url: app_url.into(),
        }
    }
}

/// A freshly built verification request: the id to track and the URL to
/// send the user to.
#[derive(Clone, Debug)]
pub struct StartedRequest {
    pub request_id: RequestId,
    pub verification_url: String,
}

/// Builds provider redirect URLs for verification attempts.
///
/// Explicitly constructed and passed by reference; there is no global
/// builder instance.
#[derive(Clone, Debug)]
pub struct RequestBuilder {
    config: BuilderConfig,
}

impl RequestBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    /// Start a verification attempt: generate a fresh request id and build
    /// the redirect URL for it.
    pub fn start(
        &self,
        provider: Provider,
        currency: Option<&str>,
    ) -> Result<StartedRequest, WebProofError> {
        let request_id = RequestId::generate();
        let verification_url = self.verification_url(provider, &request_id, currency)?;
        Ok(StartedRequest {
            request_id,
            verification_url,
        })
    }

    /// Build the provider redirect URL for an existing request id.
    ///
    /// The URL carries the request id, the provider's datasource id, the
    /// customer id, the redirect-back URL (which itself embeds the provider
    /// tag and request id so the returning context can resume the right
    /// flow), and, on secure app URLs only, a webhook URL.
    pub fn verification_url(
        &self,
        provider: Provider,
        request_id: &RequestId,
        currency: Option<&str>,
    ) -> Result<String, WebProofError> {
        if self.config.customer_id.trim().is_empty() {
            return Err(WebProofError::Configuration(
                "customer id is not configured".into(),
            ));
        }

        let app_url = self.config.app_url.trim_end_matches('/');
        let redirect_back = format!(
            "{app_url}{RETURN_PATH}?vouch={}&requestId={}",
            provider.tag(),
            request_id
        );

        let mut params: Vec<(&str, String)> = vec![
            ("requestId", request_id.to_string()),
            ("datasourceId", provider.datasource_id().to_string()),
            ("customerId", self.config.customer_id.clone()),
        ];

        if provider.requires_currency() {
            let currency = currency.unwrap_or_default().trim();
            if currency.is_empty() {
                return Err(WebProofError::Configuration(format!(
                    "provider {provider} requires a currency code"
                )));
            }
            params.push(("currency", currency.to_uppercase()));
        }

        params.push(("redirectBackUrl", redirect_back));

        // The provider rejects insecure webhook targets, so the parameter
        // is present iff the app URL uses https.
        if app_url.starts_with("https://") {
            params.push(("webhookUrl", format!("{app_url}{WEBHOOK_PATH}")));
        }

        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{k}={}", query::encode(v)))
            .collect();

        let url = format!("{}?{}", self.config.start_url, query.join("&"));

        tracing::debug!(
            request_id = %request_id,
            provider = %provider,
            has_webhook = app_url.starts_with("https://"),
            "built verification url"
        );

        Ok(url)
    }
}

/// Recover `(provider, request_id)` from the query string of a returning
/// redirect (`vouch=<tag>&requestId=<id>`).
///
/// Accepts a bare query string, one with a leading `?`, or a full URL.
/// Returns `None` when either parameter is missing or the tag is unknown.
pub fn parse_return_params(query: &str) -> Option<(Provider, RequestId)> {
    let query = query.rsplit_once('?').map_or(query, |(_, q)| q);

    let mut provider = None;
    let mut request_id = None;
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key {
            "vouch" => provider = Provider::from_tag(&query::decode(value)),
            "requestId" => {
                let id = query::decode(value);
                if !id.is_empty() {
                    request_id = Some(RequestId::new(id));
                }
            }
            _ => {}
        }
    }
    Some((provider?, request_id?))
}

// Minimal percent-encoding for query values; inlined to avoid pulling in a
// URL crate for two functions.
mod query {
    pub fn encode(value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for byte in value.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    out.push(byte as char)
                }
                _ => out.push_str(&format!("%{:02X}", byte)),
            }
        }
        out
    }

    pub fn decode(value: &str) -> String {
        let bytes = value.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' && i + 2 < bytes.len() {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
            out.push(bytes[i]);
            i += 1;
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}
