//! Application configuration with TOML file support.

use creditline_types::{FlowParams, NetworkConfig};
use serde::{Deserialize, Serialize};

/// Configuration for the creditline CLI.
///
/// Can be loaded from a TOML file via [`AppConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). CLI flags and environment
/// variables override file values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Customer/tenant id issued by the Web Proof provider.
    #[serde(default)]
    pub customer_id: String,

    /// The application's own base URL. Whether this is https decides
    /// whether a webhook URL is offered to the provider.
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Override for the provider's hosted verification page URL.
    #[serde(default)]
    pub start_url: Option<String>,

    /// Override for the provider's proof lookup API base URL.
    #[serde(default)]
    pub proof_api_base: Option<String>,

    /// Target chain and submission gateway.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Flow tunables (poll budget, intervals, extraction multiplier).
    #[serde(default)]
    pub params: FlowParams,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_app_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {path}: {e}"))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("AppConfig is always serializable to TOML")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            customer_id: String::new(),
            app_url: default_app_url(),
            start_url: None,
            proof_api_base: None,
            network: NetworkConfig::default(),
            params: FlowParams::default(),
            log_level: default_log_level(),
        }
    }
}
