//! ERC-20 token metadata resolution with a process-lifetime cache.
//!
//! Resolution is three-tiered: a static table of well-known BSC deployments
//! (no I/O), a runtime cache, and finally one burst of three concurrent
//! metadata reads against the chain. Lookup failures degrade to a fixed
//! fallback record which is cached too, so a misbehaving token address costs
//! at most one failed burst for the lifetime of the process. Resolution
//! never fails past this module's boundary.

use std::time::Duration;

use alloy_primitives::{Address, U256, address};
use alloy_provider::Provider;
use async_trait::async_trait;
use b402::network::Network;
use dashmap::DashMap;
use serde::Serialize;

use crate::contract::IERC20Metadata;
use crate::error::RelayError;

/// Metadata for one ERC-20 token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    /// Decimal places of the token's smallest unit.
    pub decimals: u8,
    /// Ticker symbol.
    pub symbol: String,
    /// Full token name.
    pub name: String,
}

impl TokenInfo {
    /// The record returned (and cached) when a token cannot be resolved.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            decimals: 18,
            symbol: "TOKEN".to_owned(),
            name: "Unknown Token".to_owned(),
        }
    }
}

/// A well-known token deployment with static metadata.
#[derive(Debug, Clone, Copy)]
pub struct KnownToken {
    /// Deployment address.
    pub address: Address,
    /// Network the deployment lives on.
    pub network: Network,
    /// Decimal places.
    pub decimals: u8,
    /// Ticker symbol.
    pub symbol: &'static str,
    /// Full token name.
    pub name: &'static str,
}

impl KnownToken {
    fn info(&self) -> TokenInfo {
        TokenInfo {
            decimals: self.decimals,
            symbol: self.symbol.to_owned(),
            name: self.name.to_owned(),
        }
    }
}

/// Stablecoin deployments the facilitator knows without chain reads.
///
/// Order matters for [`supported_assets`]: it is the order `/list` reports.
pub static KNOWN_TOKENS: &[KnownToken] = &[
    KnownToken {
        address: address!("0x55d398326f99059fF775485246999027B3197955"),
        network: Network::Bsc,
        decimals: 18,
        symbol: "USDT",
        name: "Tether USD",
    },
    KnownToken {
        address: address!("0x8d0d000ee44948fc98c9b98a4fa4921476f08b0d"),
        network: Network::Bsc,
        decimals: 18,
        symbol: "USD1",
        name: "World Liberty Financial USD",
    },
    KnownToken {
        address: address!("0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d"),
        network: Network::Bsc,
        decimals: 18,
        symbol: "USDC",
        name: "USD Coin",
    },
    KnownToken {
        address: address!("0x337610d27c682E347C9cD60BD4b3b107C9d34dDd"),
        network: Network::BscTestnet,
        decimals: 6,
        symbol: "USDT",
        name: "Tether USD (Testnet)",
    },
];

/// Looks up static metadata for a well-known deployment.
#[must_use]
pub fn known_token_info(token: Address) -> Option<TokenInfo> {
    KNOWN_TOKENS
        .iter()
        .find(|known| known.address == token)
        .map(KnownToken::info)
}

/// Token addresses the facilitator advertises for `network`.
#[must_use]
pub fn supported_assets(network: Network) -> Vec<Address> {
    KNOWN_TOKENS
        .iter()
        .filter(|known| known.network == network)
        .map(|known| known.address)
        .collect()
}

/// One burst of chain reads resolving a token's metadata.
///
/// Separated from [`TokenInfoCache`] so tests can count bursts; the cache
/// owns the dedup and fallback semantics.
#[async_trait]
pub trait TokenMetadataFetch: Send + Sync {
    /// Reads `decimals`, `symbol`, and `name` for `token`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError`] if any of the three reads fails; the caller
    /// degrades to [`TokenInfo::fallback`].
    async fn fetch(&self, token: Address) -> Result<TokenInfo, RelayError>;
}

/// Production [`TokenMetadataFetch`] issuing three concurrent contract reads.
#[derive(Debug)]
pub struct ErcMetadataFetcher<P> {
    provider: P,
    rpc_timeout: Duration,
}

impl<P> ErcMetadataFetcher<P> {
    /// Creates a fetcher over `provider` with a per-burst deadline.
    pub const fn new(provider: P, rpc_timeout: Duration) -> Self {
        Self {
            provider,
            rpc_timeout,
        }
    }
}

#[async_trait]
impl<P> TokenMetadataFetch for ErcMetadataFetcher<P>
where
    P: Provider + Send + Sync,
{
    async fn fetch(&self, token: Address) -> Result<TokenInfo, RelayError> {
        let erc20 = IERC20Metadata::new(token, &self.provider);
        let decimals_call = erc20.decimals();
        let symbol_call = erc20.symbol();
        let name_call = erc20.name();
        let burst = async {
            tokio::try_join!(
                decimals_call.call().into_future(),
                symbol_call.call().into_future(),
                name_call.call().into_future(),
            )
        };
        let (decimals, symbol, name) = tokio::time::timeout(self.rpc_timeout, burst)
            .await
            .map_err(|_| RelayError::Timeout(self.rpc_timeout))??;
        Ok(TokenInfo {
            decimals,
            symbol,
            name,
        })
    }
}

/// Process-lifetime token metadata cache.
///
/// Owned by the service composition root and injected where needed; there is
/// no module-level state. Concurrent first-time lookups for the same token
/// may race and fetch twice — the results converge, so no locking guards the
/// populate path.
#[derive(Debug, Default)]
pub struct TokenInfoCache {
    cache: DashMap<Address, TokenInfo>,
}

impl TokenInfoCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves metadata for `token`, consulting the static table, then the
    /// cache, then `fetcher`. Never fails: fetch errors cache and return the
    /// fallback record.
    pub async fn resolve<F>(&self, token: Address, fetcher: &F) -> TokenInfo
    where
        F: TokenMetadataFetch + ?Sized,
    {
        if let Some(info) = known_token_info(token) {
            return info;
        }
        if let Some(hit) = self.cache.get(&token) {
            return hit.clone();
        }
        let info = match fetcher.fetch(token).await {
            Ok(info) => info,
            Err(error) => {
                tracing::warn!(%token, %error, "token metadata lookup failed, caching fallback");
                TokenInfo::fallback()
            }
        };
        self.cache.insert(token, info.clone());
        info
    }
}

/// Renders a raw token amount as a decimal string, e.g. `1.5` for
/// `1500000000000000000` at 18 decimals.
///
/// Keeps one fractional digit for whole amounts (`"1.0"`), matching how the
/// event log has always recorded formatted amounts.
#[must_use]
pub fn format_units(value: U256, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let scale = U256::from(10u64).pow(U256::from(u64::from(decimals)));
    let (integer, fraction) = value.div_rem(scale);
    let mut fraction = format!("{fraction:0>width$}", width = usize::from(decimals));
    while fraction.len() > 1 && fraction.ends_with('0') {
        fraction.pop();
    }
    format!("{integer}.{fraction}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingFetcher {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenMetadataFetch for CountingFetcher {
        async fn fetch(&self, _token: Address) -> Result<TokenInfo, RelayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(RelayError::ContractCall("no such token".to_owned()))
            } else {
                Ok(TokenInfo {
                    decimals: 8,
                    symbol: "MOCK".to_owned(),
                    name: "Mock Token".to_owned(),
                })
            }
        }
    }

    #[tokio::test]
    async fn test_known_token_skips_fetch() {
        let cache = TokenInfoCache::new();
        let fetcher = CountingFetcher::new(false);
        let usdt = address!("0x55d398326f99059fF775485246999027B3197955");

        let info = cache.resolve(usdt, &fetcher).await;
        assert_eq!(info.symbol, "USDT");
        assert_eq!(info.decimals, 18);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_token_fetched_once() {
        let cache = TokenInfoCache::new();
        let fetcher = CountingFetcher::new(false);
        let token = address!("0x00000000000000000000000000000000deadbeef");

        let first = cache.resolve(token, &fetcher).await;
        let second = cache.resolve(token, &fetcher).await;
        assert_eq!(first.symbol, "MOCK");
        assert_eq!(first, second);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_caches_fallback() {
        let cache = TokenInfoCache::new();
        let fetcher = CountingFetcher::new(true);
        let token = address!("0x00000000000000000000000000000000deadbeef");

        let info = cache.resolve(token, &fetcher).await;
        assert_eq!(info, TokenInfo::fallback());

        // The failure is cached; the fetcher is not consulted again.
        let again = cache.resolve(token, &fetcher).await;
        assert_eq!(again, TokenInfo::fallback());
        assert_eq!(fetcher.calls(), 1);
    }

    #[test]
    fn test_supported_assets_per_network() {
        let mainnet = supported_assets(Network::Bsc);
        assert_eq!(mainnet.len(), 3);
        assert_eq!(
            mainnet[0],
            address!("0x55d398326f99059fF775485246999027B3197955")
        );

        let testnet = supported_assets(Network::BscTestnet);
        assert_eq!(
            testnet,
            vec![address!("0x337610d27c682E347C9cD60BD4b3b107C9d34dDd")]
        );
    }

    #[test]
    fn test_format_units() {
        let one_token = U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(format_units(one_token, 18), "1.0");
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_units(U256::ZERO, 18), "0.0");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
    }
}
