//! EIP-712 typed data for B402 payment authorizations.
//!
//! A payment authorization is signed as a `TransferWithAuthorization` struct
//! under the domain `{name: "B402", version: "1", chainId, verifyingContract}`
//! where `verifyingContract` is the relayer deployment. The domain binding is
//! what prevents a signature from being replayed on another chain or against
//! another relayer.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain, sol};
use b402::proto::Authorization;

/// EIP-712 domain name shared by every B402 relayer deployment.
pub const EIP712_DOMAIN_NAME: &str = "B402";

/// EIP-712 domain version shared by every B402 relayer deployment.
pub const EIP712_DOMAIN_VERSION: &str = "1";

sol! {
    /// The typed struct a payer signs to authorize one transfer.
    ///
    /// Field order is part of the type hash and must match the relayer
    /// contract exactly.
    #[allow(missing_docs)]
    #[derive(Debug)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
}

/// Builds the EIP-712 domain for a relayer deployment.
///
/// `chain_id` comes from facilitator configuration, never from client input;
/// `relayer_contract` comes from the payment requirements.
#[must_use]
pub fn b402_domain(chain_id: u64, relayer_contract: Address) -> Eip712Domain {
    eip712_domain! {
        name: EIP712_DOMAIN_NAME,
        version: EIP712_DOMAIN_VERSION,
        chain_id: chain_id,
        verifying_contract: relayer_contract,
    }
}

/// Computes the 32-byte digest the payer signed for `authorization`.
#[must_use]
pub fn authorization_signing_hash(authorization: &Authorization, domain: &Eip712Domain) -> B256 {
    let transfer = TransferWithAuthorization {
        from: authorization.from,
        to: authorization.to,
        value: authorization.value.as_u256(),
        validAfter: U256::from(authorization.valid_after.as_secs()),
        validBefore: U256::from(authorization.valid_before.as_secs()),
        nonce: authorization.nonce,
    };
    transfer.eip712_signing_hash(domain)
}
