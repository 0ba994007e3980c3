//! Core types for the B402 gasless payment protocol.
//!
//! B402 lets a payer authorize an ERC-20 transfer off-chain with an EIP-712
//! signature and have a facilitator execute it on-chain through the B402
//! relayer contract, paying gas on the payer's behalf. This crate provides
//! the wire format and shared domain types used by the chain layer and the
//! facilitator service. It performs no I/O.
//!
//! # Modules
//!
//! - [`error`] - Payment verification error taxonomy and wire reasons
//! - [`network`] - Supported BNB Chain deployments (mainnet, testnet)
//! - [`proto`] - Request/response envelopes for `/verify` and `/settle`
//! - [`timestamp`] - Unix timestamps bounding authorization validity windows

pub mod error;
pub mod network;
pub mod proto;
pub mod timestamp;

pub use error::PaymentVerificationError;
pub use network::Network;
pub use proto::{
    Authorization, PaymentPayload, PaymentRequirements, SettleRequest, SettleResponse,
    SignedAuthorization, TokenAmount, VerifyRequest, VerifyResponse,
};
pub use timestamp::UnixTimestamp;
