//! The relayer seam: replay-state reads and settlement submission.
//!
//! [`RelayerApi`] is the only path to chain state mutation. The production
//! implementation, [`B402RelayerContract`], wraps an Alloy provider and the
//! deployed relayer address; tests substitute doubles to count calls and to
//! simulate nonce races without a node.

use std::time::Duration;

use alloy_primitives::{Address, B256, Signature, TxHash, U256};
use alloy_provider::Provider;
use async_trait::async_trait;
use b402::error::PaymentVerificationError;
use b402::proto::{PaymentPayload, SignedAuthorization};

use crate::contract::IB402Relayer;
use crate::error::RelayError;

/// Gas ceiling for one relayed transfer when nothing is configured.
///
/// Sized for a `transferFrom`-shaped call with the relayer's bookkeeping on
/// top; a plain ERC-20 transfer uses well under half of this.
pub const DEFAULT_SETTLE_GAS_LIMIT: u64 = 200_000;

/// Parameters for one relayed `transferWithAuthorization` call.
///
/// This is the fully parsed form: the signature has already been split into
/// a recoverable ECDSA value, so building one from a payload is the last
/// point where malformed signatures can be rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelayTransfer {
    /// ERC-20 token to move.
    pub token: Address,
    /// Authorized sender.
    pub from: Address,
    /// Authorized recipient.
    pub to: Address,
    /// Transfer amount (token units).
    pub value: U256,
    /// Start of the validity window (inclusive).
    pub valid_after: U256,
    /// End of the validity window (exclusive).
    pub valid_before: U256,
    /// 32-byte authorization nonce.
    pub nonce: B256,
    /// The payer's ECDSA signature.
    pub signature: Signature,
}

impl RelayTransfer {
    /// Builds a transfer from a wire payload.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentVerificationError::InvalidSignature`] if the
    /// signature bytes are not a well-formed 65-byte signature.
    pub fn from_payload(payload: &PaymentPayload) -> Result<Self, PaymentVerificationError> {
        let SignedAuthorization {
            authorization,
            signature,
        } = &payload.payload;
        let signature = Signature::from_raw(signature)
            .map_err(|_| PaymentVerificationError::InvalidSignature)?;
        Ok(Self {
            token: payload.token,
            from: authorization.from,
            to: authorization.to,
            value: authorization.value.as_u256(),
            valid_after: U256::from(authorization.valid_after.as_secs()),
            valid_before: U256::from(authorization.valid_before.as_secs()),
            nonce: authorization.nonce,
            signature,
        })
    }
}

/// Outcome of a mined relay transaction.
#[derive(Debug, Clone, Copy)]
pub struct SettlementReceipt {
    /// Transaction hash.
    pub transaction: TxHash,
    /// Block the transaction was included in.
    pub block_number: Option<u64>,
    /// Gas consumed by the transaction.
    pub gas_used: u64,
    /// Effective gas price paid, in wei.
    pub effective_gas_price: u128,
}

/// Chain operations against the B402 relayer contract.
#[async_trait]
pub trait RelayerApi: Send + Sync {
    /// Returns whether `(authorizer, nonce)` is already consumed on-chain.
    ///
    /// Read-only; this is the replay guard's sole data source.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError`] on RPC failure or timeout.
    async fn authorization_state(&self, authorizer: Address, nonce: B256)
    -> Result<bool, RelayError>;

    /// Submits the relay transaction and waits for one confirmation.
    ///
    /// At most one transaction is submitted per call; the facilitator never
    /// retries on its own.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError`] on submission failure, revert, or confirmation
    /// timeout.
    async fn transfer_with_authorization(
        &self,
        transfer: &RelayTransfer,
    ) -> Result<SettlementReceipt, RelayError>;
}

/// Production [`RelayerApi`] backed by the deployed relayer contract.
///
/// Gas pricing is legacy (BNB Chain): the current gas price is fetched per
/// settlement and set explicitly, with a fixed gas ceiling instead of
/// estimation — the call shape is known and estimation would cost an extra
/// round trip on the hot path.
#[derive(Debug)]
pub struct B402RelayerContract<P> {
    address: Address,
    provider: P,
    gas_limit: u64,
    rpc_timeout: Duration,
    receipt_timeout: Duration,
}

impl<P> B402RelayerContract<P> {
    /// Creates a relayer binding for the deployment at `address`.
    pub const fn new(
        address: Address,
        provider: P,
        gas_limit: u64,
        rpc_timeout: Duration,
        receipt_timeout: Duration,
    ) -> Self {
        Self {
            address,
            provider,
            gas_limit,
            rpc_timeout,
            receipt_timeout,
        }
    }

    /// Address of the relayer deployment this binding talks to.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl<P> RelayerApi for B402RelayerContract<P>
where
    P: Provider + Send + Sync,
{
    async fn authorization_state(
        &self,
        authorizer: Address,
        nonce: B256,
    ) -> Result<bool, RelayError> {
        let relayer = IB402Relayer::new(self.address, &self.provider);
        let state_call = relayer.authorizationState(authorizer, nonce);
        let used = tokio::time::timeout(self.rpc_timeout, state_call.call().into_future())
            .await
            .map_err(|_| RelayError::Timeout(self.rpc_timeout))??;
        Ok(used)
    }

    async fn transfer_with_authorization(
        &self,
        transfer: &RelayTransfer,
    ) -> Result<SettlementReceipt, RelayError> {
        let relayer = IB402Relayer::new(self.address, &self.provider);
        let v = 27 + u8::from(transfer.signature.v());
        let r = B256::from(transfer.signature.r());
        let s = B256::from(transfer.signature.s());

        let gas_price_fut = self.provider.get_gas_price();
        let gas_price = tokio::time::timeout(self.rpc_timeout, gas_price_fut)
            .await
            .map_err(|_| RelayError::Timeout(self.rpc_timeout))??;

        let call = relayer
            .transferWithAuthorization(
                transfer.token,
                transfer.from,
                transfer.to,
                transfer.value,
                transfer.valid_after,
                transfer.valid_before,
                transfer.nonce,
                v,
                r,
                s,
            )
            .gas(self.gas_limit)
            .gas_price(gas_price);

        tracing::debug!(
            from = %transfer.from,
            to = %transfer.to,
            token = %transfer.token,
            value = %transfer.value,
            nonce = %transfer.nonce,
            gas_price,
            "submitting transferWithAuthorization"
        );

        let pending = call.send().await?;
        let receipt = pending
            .with_required_confirmations(1)
            .with_timeout(Some(self.receipt_timeout))
            .get_receipt()
            .await?;

        if !receipt.status() {
            return Err(RelayError::TransactionReverted(receipt.transaction_hash));
        }

        Ok(SettlementReceipt {
            transaction: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            effective_gas_price: receipt.effective_gas_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Bytes, address};
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;
    use b402::proto::{Authorization, TokenAmount};
    use b402::timestamp::UnixTimestamp;

    fn signed_payload(signature: Bytes) -> PaymentPayload {
        PaymentPayload {
            token: address!("0x337610d27c682E347C9cD60BD4b3b107C9d34dDd"),
            payload: SignedAuthorization {
                authorization: Authorization {
                    from: address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
                    to: address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8"),
                    value: TokenAmount::from(5u64),
                    valid_after: UnixTimestamp::from_secs(0),
                    valid_before: UnixTimestamp::from_secs(100),
                    nonce: B256::repeat_byte(0x01),
                },
                signature,
            },
        }
    }

    #[test]
    fn test_from_payload_splits_signature() {
        let signer = PrivateKeySigner::random();
        let signature = signer.sign_hash_sync(&B256::repeat_byte(0x22)).unwrap();
        let payload = signed_payload(signature.as_bytes().to_vec().into());

        let transfer = RelayTransfer::from_payload(&payload).unwrap();
        assert_eq!(transfer.signature, signature);
        assert_eq!(transfer.value, U256::from(5u64));
        assert_eq!(transfer.valid_before, U256::from(100u64));
    }

    #[test]
    fn test_from_payload_rejects_short_signature() {
        let payload = signed_payload(Bytes::from_static(&[0x01, 0x02, 0x03]));
        assert_eq!(
            RelayTransfer::from_payload(&payload),
            Err(PaymentVerificationError::InvalidSignature)
        );
    }
}
