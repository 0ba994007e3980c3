//! Error types for relayer interactions.

use alloy_primitives::TxHash;
use alloy_transport::TransportError;
use b402::error::PaymentVerificationError;
use std::time::Duration;

/// Errors from chain-facing relayer operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// RPC transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Pending transaction error (confirmation wait failed or timed out).
    #[error(transparent)]
    PendingTransaction(#[from] alloy_provider::PendingTransactionError),
    /// On-chain transaction was mined but reverted.
    #[error("Transaction {0} reverted")]
    TransactionReverted(TxHash),
    /// Contract call failed.
    #[error("Contract call failed: {0}")]
    ContractCall(String),
    /// An RPC call exceeded the configured deadline.
    #[error("RPC call timed out after {0:?}")]
    Timeout(Duration),
    /// Payment verification failed.
    #[error(transparent)]
    PaymentVerification(#[from] PaymentVerificationError),
}

impl RelayError {
    /// Short, stable summary safe to place in a response body.
    ///
    /// Transport errors can carry endpoint URLs (and therefore credentials
    /// embedded in them), so they are reduced to a fixed phrase; full detail
    /// goes to operator logs only.
    #[must_use]
    pub fn wire_reason(&self) -> String {
        match self {
            Self::Transport(_) => "RPC transport error".to_owned(),
            Self::PendingTransaction(_) => "Transaction confirmation failed".to_owned(),
            Self::TransactionReverted(tx) => format!("Transaction {tx} reverted"),
            Self::ContractCall(_) => "Contract call failed".to_owned(),
            Self::Timeout(duration) => format!("RPC call timed out after {duration:?}"),
            Self::PaymentVerification(e) => e.to_string(),
        }
    }
}

impl From<alloy_contract::Error> for RelayError {
    fn from(e: alloy_contract::Error) -> Self {
        match e {
            alloy_contract::Error::TransportError(e) => Self::Transport(e),
            alloy_contract::Error::PendingTransactionError(e) => Self::PendingTransaction(e),
            other => Self::ContractCall(other.to_string()),
        }
    }
}
