//! BNB Chain support for the B402 gasless payment protocol.
//!
//! Implements the chain-facing half of the facilitator: EIP-712 signature
//! verification against the B402 relayer domain, the on-chain replay guard
//! (`authorizationState`), settlement through the relayer's
//! `transferWithAuthorization` entry point, and ERC-20 token metadata
//! resolution with a process-lifetime cache.
//!
//! # Architecture
//!
//! - [`contract`] - Minimal Alloy ABI bindings for the relayer and ERC-20 metadata
//! - [`eip712`] - The `TransferWithAuthorization` typed struct and B402 domain
//! - [`verify`] - Pure signature recovery and validity-window checks
//! - [`relayer`] - [`RelayerApi`] seam plus the contract-backed implementation
//! - [`tokens`] - Token metadata resolver, static known-token table, cache
//!
//! All chain I/O flows through the [`RelayerApi`] and
//! [`tokens::TokenMetadataFetch`] traits so the service layer can be
//! exercised against test doubles.

pub mod contract;
pub mod eip712;
pub mod error;
pub mod relayer;
pub mod tokens;
pub mod verify;

pub use error::RelayError;
pub use relayer::{B402RelayerContract, RelayTransfer, RelayerApi, SettlementReceipt};
pub use tokens::{TokenInfo, TokenInfoCache, TokenMetadataFetch};
