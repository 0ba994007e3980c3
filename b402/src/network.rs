//! Supported BNB Chain deployments.
//!
//! The facilitator runs against exactly one network at a time, selected at
//! startup from configuration. Chain IDs feed the EIP-712 domain, so a
//! signature produced for one network can never verify on the other.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;

/// A BNB Chain network supported by the B402 relayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    /// BNB Smart Chain mainnet (chain id 56).
    Bsc,
    /// BNB Smart Chain testnet (chain id 97).
    BscTestnet,
}

impl Network {
    /// Numeric EIP-155 chain id, also used in the EIP-712 domain.
    #[must_use]
    pub const fn chain_id(self) -> u64 {
        match self {
            Self::Bsc => 56,
            Self::BscTestnet => 97,
        }
    }

    /// Human-readable network label used on the wire.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bsc => "bsc",
            Self::BscTestnet => "bsc-testnet",
        }
    }

    /// Public JSON-RPC endpoint used when no override is configured.
    #[must_use]
    pub const fn default_rpc_url(self) -> &'static str {
        match self {
            Self::Bsc => "https://bsc-dataseed.bnbchain.org",
            Self::BscTestnet => "https://data-seed-prebsc-1-s1.binance.org:8545",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown network label.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown network {0:?}, expected one of: bsc, bsc-testnet, mainnet, testnet")]
pub struct NetworkParseError(String);

impl FromStr for Network {
    type Err = NetworkParseError;

    /// Accepts both wire labels (`bsc`, `bsc-testnet`) and the `NETWORK`
    /// configuration modes (`mainnet`, `testnet`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bsc" | "mainnet" => Ok(Self::Bsc),
            "bsc-testnet" | "testnet" => Ok(Self::BscTestnet),
            other => Err(NetworkParseError(other.to_owned())),
        }
    }
}

impl Serialize for Network {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(de::Error::custom)
    }
}
