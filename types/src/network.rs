//! Target chain configuration.

use serde::{Deserialize, Serialize};

/// Where income commitments are submitted: chain, gateway, and the fixed
/// verifier contract address.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Human-readable chain name.
    pub chain_name: String,
    /// Submission gateway URL (JSON-RPC).
    pub gateway_url: String,
    /// Block explorer base URL.
    pub block_explorer: String,
    /// Address of the income verifier contract.
    pub verifier_contract: String,
}

impl NetworkConfig {
    /// Polygon mainnet, the deployment the flow targets by default.
    pub fn polygon_mainnet() -> Self {
        Self {
            chain_id: 137,
            chain_name: "Polygon Mainnet".to_string(),
            gateway_url: "https://polygon-bor-rpc.publicnode.com".to_string(),
            block_explorer: "https://polygonscan.com".to_string(),
            verifier_contract: "0x8b00dEE5209e73F1D92bE834223D3497c57b4263".to_string(),
        }
    }

    /// Explorer link for a transaction hash.
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.block_explorer.trim_end_matches('/'), tx_hash)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::polygon_mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_defaults() {
        let net = NetworkConfig::polygon_mainnet();
        assert_eq!(net.chain_id, 137);
        assert!(net.verifier_contract.starts_with("0x"));
    }

    #[test]
    fn tx_url_joins_cleanly() {
        let mut net = NetworkConfig::polygon_mainnet();
        net.block_explorer = "https://polygonscan.com/".to_string();
        assert_eq!(
            net.tx_url("0xabc"),
            "https://polygonscan.com/tx/0xabc"
        );
    }
}
