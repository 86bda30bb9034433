//! Chain account address type with `0x` prefix.

use crate::error::CreditError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An EVM-style account address: `0x` followed by 40 hex characters.
///
/// Wallet credentials (keys, signing) are out of scope for this flow; the
/// address is an opaque identifier supplied by the host wallet.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainAddress(String);

impl ChainAddress {
    /// The standard prefix for all chain addresses.
    pub const PREFIX: &'static str = "0x";

    /// Parse and validate an address string.
    pub fn parse(raw: impl Into<String>) -> Result<Self, CreditError> {
        let s = raw.into();
        let addr = Self(s);
        if addr.is_valid() {
            Ok(addr)
        } else {
            Err(CreditError::InvalidAddress(addr.0))
        }
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed (`0x` + 40 hex chars).
    pub fn is_valid(&self) -> bool {
        let Some(body) = self.0.strip_prefix(Self::PREFIX) else {
            return false;
        };
        body.len() == 40 && body.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl fmt::Display for ChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_address_parses() {
        let addr = ChainAddress::parse("0x8b00dEE5209e73F1D92bE834223D3497c57b4263");
        assert!(addr.is_ok());
    }

    #[test]
    fn missing_prefix_rejected() {
        let result = ChainAddress::parse("8b00dEE5209e73F1D92bE834223D3497c57b4263");
        assert!(matches!(result, Err(CreditError::InvalidAddress(_))));
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(ChainAddress::parse("0xabc").is_err());
    }

    #[test]
    fn non_hex_rejected() {
        assert!(ChainAddress::parse(format!("0x{}", "zz".repeat(20))).is_err());
    }
}
