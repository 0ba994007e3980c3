//! Facilitator configuration.
//!
//! All settings come from the environment (a `.env` file is honored) and are
//! resolved exactly once at startup into a [`FacilitatorConfig`] that is
//! passed explicitly to the components that need it. Request handling never
//! reads the environment.
//!
//! # Environment Variables
//!
//! - `NETWORK` — `mainnet` or `testnet` (default: `testnet`)
//! - `RELAYER_PRIVATE_KEY` — hex signing key for the facilitator (required)
//! - `B402_RELAYER_ADDRESS` — deployed relayer contract address (required)
//! - `BSC_RPC_URL` / `BSC_TESTNET_RPC_URL` — RPC endpoint overrides
//! - `HOST` — bind address (default: `0.0.0.0`)
//! - `PORT` — bind port (default: `3402`)
//! - `SETTLE_GAS_LIMIT` — gas ceiling per relay transaction (default: 200000)
//! - `RPC_TIMEOUT_SECS` — deadline for read calls (default: 10)
//! - `TX_RECEIPT_TIMEOUT_SECS` — confirmation wait deadline (default: 30)
//! - `EVENT_LOG_URL` / `EVENT_LOG_API_KEY` — optional event sink

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use b402::network::Network;
use b402_evm::relayer::DEFAULT_SETTLE_GAS_LIMIT;
use url::Url;

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is absent or empty.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    /// An environment variable has an unusable value.
    #[error("invalid {0}: {1}")]
    Invalid(&'static str, String),
}

/// Resolved facilitator configuration.
///
/// The signing key lives only in the contained [`PrivateKeySigner`]; it is
/// excluded from the `Debug` output and must never be logged or echoed in
/// any response.
#[derive(Clone)]
pub struct FacilitatorConfig {
    /// Network the facilitator settles on.
    pub network: Network,
    /// Deployed B402 relayer contract.
    pub relayer_address: Address,
    /// Facilitator signing key (pays gas for relayed transfers).
    pub signer: PrivateKeySigner,
    /// JSON-RPC endpoint for the selected network.
    pub rpc_url: Url,
    /// HTTP bind address.
    pub host: IpAddr,
    /// HTTP bind port.
    pub port: u16,
    /// Gas ceiling per relay transaction.
    pub settle_gas_limit: u64,
    /// Deadline for read-only RPC calls.
    pub rpc_timeout: Duration,
    /// Deadline for the one-confirmation receipt wait.
    pub receipt_timeout: Duration,
    /// Optional event sink endpoint.
    pub event_log_url: Option<Url>,
    /// Optional event sink API key.
    pub event_log_api_key: Option<String>,
}

impl fmt::Debug for FacilitatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacilitatorConfig")
            .field("network", &self.network)
            .field("relayer_address", &self.relayer_address)
            .field("signer", &self.signer.address())
            .field("rpc_url", &self.rpc_url.as_str())
            .field("host", &self.host)
            .field("port", &self.port)
            .field("settle_gas_limit", &self.settle_gas_limit)
            .field("rpc_timeout", &self.rpc_timeout)
            .field("receipt_timeout", &self.receipt_timeout)
            .field("event_log_url", &self.event_log_url.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

/// Reads an environment variable, treating empty values as unset.
fn var(name: &'static str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

impl FacilitatorConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is absent or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let network = match var("NETWORK") {
            Some(raw) => raw
                .parse::<Network>()
                .map_err(|e| ConfigError::Invalid("NETWORK", e.to_string()))?,
            None => Network::BscTestnet,
        };

        let signer = var("RELAYER_PRIVATE_KEY")
            .ok_or(ConfigError::Missing("RELAYER_PRIVATE_KEY"))?
            .parse::<PrivateKeySigner>()
            .map_err(|_| {
                // Do not echo the value; it is a secret even when malformed.
                ConfigError::Invalid("RELAYER_PRIVATE_KEY", "not a valid signing key".to_owned())
            })?;

        let relayer_address = var("B402_RELAYER_ADDRESS")
            .ok_or(ConfigError::Missing("B402_RELAYER_ADDRESS"))?
            .parse::<Address>()
            .map_err(|e| ConfigError::Invalid("B402_RELAYER_ADDRESS", e.to_string()))?;

        let rpc_var = match network {
            Network::Bsc => "BSC_RPC_URL",
            Network::BscTestnet => "BSC_TESTNET_RPC_URL",
        };
        let rpc_url = var(rpc_var).unwrap_or_else(|| network.default_rpc_url().to_owned());
        let rpc_url = rpc_url
            .parse::<Url>()
            .map_err(|e| ConfigError::Invalid(rpc_var, e.to_string()))?;

        let host = match var("HOST") {
            Some(raw) => raw
                .parse::<IpAddr>()
                .map_err(|e| ConfigError::Invalid("HOST", e.to_string()))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = match var("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::Invalid("PORT", e.to_string()))?,
            None => 3402,
        };

        let settle_gas_limit = match var("SETTLE_GAS_LIMIT") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| ConfigError::Invalid("SETTLE_GAS_LIMIT", e.to_string()))?,
            None => DEFAULT_SETTLE_GAS_LIMIT,
        };

        let rpc_timeout = Duration::from_secs(match var("RPC_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| ConfigError::Invalid("RPC_TIMEOUT_SECS", e.to_string()))?,
            None => 10,
        });
        let receipt_timeout = Duration::from_secs(match var("TX_RECEIPT_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| ConfigError::Invalid("TX_RECEIPT_TIMEOUT_SECS", e.to_string()))?,
            None => 30,
        });

        let event_log_url = match var("EVENT_LOG_URL") {
            Some(raw) => Some(
                raw.parse::<Url>()
                    .map_err(|e| ConfigError::Invalid("EVENT_LOG_URL", e.to_string()))?,
            ),
            None => None,
        };
        let event_log_api_key = var("EVENT_LOG_API_KEY");

        Ok(Self {
            network,
            relayer_address,
            signer,
            rpc_url,
            host,
            port,
            settle_gas_limit,
            rpc_timeout,
            receipt_timeout,
            event_log_url,
            event_log_api_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_omits_signing_key() {
        let signer = PrivateKeySigner::random();
        let config = FacilitatorConfig {
            network: Network::BscTestnet,
            relayer_address: Address::ZERO,
            signer: signer.clone(),
            rpc_url: "https://example.invalid".parse().unwrap(),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3402,
            settle_gas_limit: DEFAULT_SETTLE_GAS_LIMIT,
            rpc_timeout: Duration::from_secs(10),
            receipt_timeout: Duration::from_secs(30),
            event_log_url: None,
            event_log_api_key: None,
        };
        let rendered = format!("{config:?}").to_lowercase();
        assert!(rendered.contains(&signer.address().to_string().to_lowercase()));
        let key_hex = alloy_primitives::hex::encode(signer.to_bytes());
        assert!(!rendered.contains(&key_hex));
    }
}
