use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{PointsTrackerError, Result};

pub const EMPTY_ADDRESS: &str = "Please enter a wallet address";
pub const MALFORMED_ADDRESS: &str = "Invalid wallet address format";

const ADDRESS_HEX_LEN: usize = 40;

/// Canonical (trimmed, lowercase) EVM wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Sanitize then validate: `0x` followed by exactly 40 hex characters.
    pub fn parse(input: &str) -> Result<Self> {
        let sanitized = input.trim().to_lowercase();
        if sanitized.is_empty() {
            return Err(PointsTrackerError::InvalidAddress(EMPTY_ADDRESS.to_string()));
        }

        let hex_part = match sanitized.strip_prefix("0x") {
            Some(rest) if rest.len() == ADDRESS_HEX_LEN => rest,
            _ => return Err(PointsTrackerError::InvalidAddress(MALFORMED_ADDRESS.to_string())),
        };

        hex::decode(hex_part)
            .map_err(|_| PointsTrackerError::InvalidAddress(MALFORMED_ADDRESS.to_string()))?;

        Ok(Self(sanitized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn is_valid_wallet_address(input: &str) -> bool {
    WalletAddress::parse(input).is_ok()
}

impl FromStr for WalletAddress {
    type Err = PointsTrackerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = PointsTrackerError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(address: WalletAddress) -> Self {
        address.0
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
