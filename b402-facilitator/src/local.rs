//! The verify/settle composition root.
//!
//! [`LocalFacilitator`] owns every collaborator a request needs: the relayer
//! binding, the token metadata cache, and the event sink. Business
//! rejections come back as response values; only transport-level failures
//! surface as errors for the handlers to map to HTTP 500.

use std::sync::Arc;
use std::time::Instant;

use alloy_primitives::Address;
use b402::error::PaymentVerificationError;
use b402::network::Network;
use b402::proto::{
    PaymentPayload, SettleRequest, SettleResponse, VerifyRequest, VerifyResponse,
};
use b402_evm::eip712::b402_domain;
use b402_evm::relayer::{RelayTransfer, RelayerApi, SettlementReceipt};
use b402_evm::tokens::{TokenInfo, TokenInfoCache, TokenMetadataFetch, format_units};
use b402_evm::verify::{assert_signature, assert_time};
use b402_evm::RelayError;

use crate::events::{EventLog, SettleRecord, VerifyRecord, unix_now};
use crate::metrics;

/// The facilitator service core, shared across requests.
pub struct LocalFacilitator {
    network: Network,
    relayer_address: Address,
    signer_address: Address,
    relayer: Arc<dyn RelayerApi>,
    token_fetcher: Arc<dyn TokenMetadataFetch>,
    token_cache: TokenInfoCache,
    events: EventLog,
}

impl std::fmt::Debug for LocalFacilitator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFacilitator")
            .field("network", &self.network)
            .field("relayer_address", &self.relayer_address)
            .field("signer_address", &self.signer_address)
            .finish_non_exhaustive()
    }
}

impl LocalFacilitator {
    /// Creates the facilitator core.
    #[must_use]
    pub fn new(
        network: Network,
        relayer_address: Address,
        signer_address: Address,
        relayer: Arc<dyn RelayerApi>,
        token_fetcher: Arc<dyn TokenMetadataFetch>,
        events: EventLog,
    ) -> Self {
        Self {
            network,
            relayer_address,
            signer_address,
            relayer,
            token_fetcher,
            token_cache: TokenInfoCache::new(),
            events,
        }
    }

    /// Network this facilitator settles on.
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    /// Deployed relayer contract address.
    #[must_use]
    pub const fn relayer_address(&self) -> Address {
        self.relayer_address
    }

    /// Address of the facilitator's gas-paying signer.
    #[must_use]
    pub const fn signer_address(&self) -> Address {
        self.signer_address
    }

    /// Resolves token metadata through the cache (never fails).
    pub async fn token_info(&self, token: Address) -> TokenInfo {
        self.token_cache
            .resolve(token, self.token_fetcher.as_ref())
            .await
    }

    /// Verifies a payment authorization: signature, replay state, validity
    /// window — in that order.
    ///
    /// Business rejections are returned as `Ok` responses with
    /// `isValid: false`; the outcome is also recorded to the event sink.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError`] only for transport-level failures (the replay
    /// state could not be read).
    pub async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, RelayError> {
        let started = Instant::now();
        let payload = &request.payment_payload;
        let outcome = self
            .check_authorization(payload, request.payment_requirements.relayer_contract)
            .await?;

        let response = match outcome {
            Ok(payer) => {
                tracing::info!(
                    payer = %payer,
                    recipient = %payload.payload.authorization.to,
                    token = %payload.token,
                    value = %payload.payload.authorization.value,
                    "verify ok"
                );
                VerifyResponse::valid(payer)
            }
            Err(reason) => {
                tracing::info!(
                    payer = %payload.payload.authorization.from,
                    reason = %reason,
                    "verify rejected"
                );
                VerifyResponse::invalid(reason.to_string())
            }
        };

        self.log_verify(payload, &response, started).await;
        Ok(response)
    }

    /// Runs the validation pipeline in the contractual order.
    ///
    /// The signature must be established before the replay lookup so a
    /// forged `from` can never probe another account's nonce state, and the
    /// nonce check precedes the window check.
    async fn check_authorization(
        &self,
        payload: &PaymentPayload,
        relayer_contract: Address,
    ) -> Result<Result<Address, PaymentVerificationError>, RelayError> {
        let authorization = &payload.payload.authorization;
        let domain = b402_domain(self.network.chain_id(), relayer_contract);

        let payer =
            match assert_signature(authorization, &payload.payload.signature, &domain) {
                Ok(payer) => payer,
                Err(reason) => return Ok(Err(reason)),
            };

        let used = self
            .relayer
            .authorization_state(authorization.from, authorization.nonce)
            .await?;
        if used {
            return Ok(Err(PaymentVerificationError::NonceAlreadyUsed));
        }

        if let Err(reason) = assert_time(authorization.valid_after, authorization.valid_before) {
            return Ok(Err(reason));
        }

        Ok(Ok(payer))
    }

    /// Executes a verified authorization on-chain.
    ///
    /// Settlement does not re-derive a validity judgment; the relayer
    /// contract is the final authority and reverts on an invalid, expired,
    /// or replayed authorization. At most one transaction is submitted.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError`] on submission failure, revert, or confirmation
    /// timeout; the failure is recorded to the event sink first.
    pub async fn settle(&self, request: &SettleRequest) -> Result<SettleResponse, RelayError> {
        let started = Instant::now();
        let payload = &request.payment_payload;

        let transfer = match RelayTransfer::from_payload(payload) {
            Ok(transfer) => transfer,
            Err(reason) => {
                self.log_settle(payload, Err(&reason.to_string()), None, started)
                    .await;
                return Err(reason.into());
            }
        };

        let tx_started = Instant::now();
        match self.relayer.transfer_with_authorization(&transfer).await {
            Ok(receipt) => {
                let tx_duration = tx_started.elapsed();
                tracing::info!(
                    tx = %receipt.transaction,
                    block = receipt.block_number,
                    gas_used = receipt.gas_used,
                    duration_ms = tx_duration.as_millis() as u64,
                    "settle ok"
                );
                metrics::SETTLE_GAS_USED.set(receipt.gas_used as i64);
                metrics::SETTLE_TRANSACTION_SECONDS.observe(tx_duration.as_secs_f64());

                self.log_settle(payload, Ok(&receipt), Some(tx_duration.as_millis() as u64), started)
                    .await;
                Ok(SettleResponse::success(
                    self.network,
                    transfer.from,
                    receipt.transaction,
                    receipt.block_number,
                ))
            }
            Err(error) => {
                tracing::warn!(
                    payer = %transfer.from,
                    token = %transfer.token,
                    error = %error,
                    "settle failed"
                );
                self.log_settle(payload, Err(&error.wire_reason()), None, started)
                    .await;
                Err(error)
            }
        }
    }

    async fn log_verify(&self, payload: &PaymentPayload, response: &VerifyResponse, started: Instant) {
        let authorization = &payload.payload.authorization;
        let token_info = self.token_info(payload.token).await;
        self.events.record_verify(VerifyRecord {
            payer: authorization.from,
            recipient: authorization.to,
            token: payload.token,
            token_symbol: token_info.symbol.clone(),
            amount: authorization.value.to_string(),
            amount_formatted: format_units(authorization.value.as_u256(), token_info.decimals),
            nonce: authorization.nonce,
            network: self.network.name().to_owned(),
            chain_id: self.network.chain_id(),
            is_valid: response.is_valid,
            invalid_reason: response.invalid_reason.clone(),
            timestamp: unix_now(),
            duration_ms: started.elapsed().as_millis() as u64,
        });
    }

    async fn log_settle(
        &self,
        payload: &PaymentPayload,
        outcome: Result<&SettlementReceipt, &str>,
        transaction_time_ms: Option<u64>,
        started: Instant,
    ) {
        let authorization = &payload.payload.authorization;
        let token_info = self.token_info(payload.token).await;
        let (receipt, error_reason) = match outcome {
            Ok(receipt) => (Some(receipt), None),
            Err(reason) => (None, Some(reason.to_owned())),
        };
        self.events.record_settle(SettleRecord {
            transaction_hash: receipt.map(|r| r.transaction),
            payer: authorization.from,
            recipient: authorization.to,
            token: payload.token,
            token_symbol: token_info.symbol.clone(),
            amount: authorization.value.to_string(),
            amount_formatted: format_units(authorization.value.as_u256(), token_info.decimals),
            nonce: authorization.nonce,
            network: self.network.name().to_owned(),
            chain_id: self.network.chain_id(),
            block_number: receipt.and_then(|r| r.block_number),
            gas_used: receipt.map(|r| r.gas_used),
            gas_price: receipt.map(|r| r.effective_gas_price.to_string()),
            success: receipt.is_some(),
            error_reason,
            transaction_time_ms,
            total_time_ms: started.elapsed().as_millis() as u64,
            timestamp: unix_now(),
        });
    }
}
