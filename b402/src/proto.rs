//! Wire format for the B402 facilitator HTTP API.
//!
//! Requests wrap a signed [`Authorization`] (the payment intent) together
//! with the [`PaymentRequirements`] naming the relayer deployment to verify
//! against. Responses carry the validity or settlement outcome in the body;
//! business rejections are data, not HTTP errors.
//!
//! All structures use camelCase field names on the wire and typed values:
//! addresses, the 32-byte nonce, and amounts are validated once during
//! deserialization, so downstream components never see loosely-typed input.

use alloy_primitives::{Address, B256, Bytes, TxHash, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::network::Network;
use crate::timestamp::UnixTimestamp;

/// A transfer amount in the token's smallest unit.
///
/// # Serialization
///
/// Serialized as a decimal string (`"1000000000000000000"`) to survive
/// JSON number precision limits; deserialization also accepts a plain JSON
/// number and `0x`-prefixed hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(pub U256);

impl TokenAmount {
    /// Returns the raw amount.
    #[must_use]
    pub const fn as_u256(&self) -> U256 {
        self.0
    }
}

impl From<U256> for TokenAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<TokenAmount> for U256 {
    fn from(value: TokenAmount) -> Self {
        value.0
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(U256::from(n))),
            Raw::Text(s) => U256::from_str(&s)
                .map(Self)
                .map_err(|_| serde::de::Error::custom("amount must be a non-negative integer")),
        }
    }
}

/// A payment intent, authored and signed by the payer off-chain.
///
/// The EIP-712 signature covers exactly this tuple under the B402 domain;
/// any mutation invalidates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    /// Payer account (the signer).
    pub from: Address,
    /// Payee account.
    pub to: Address,
    /// Transfer amount in the token's smallest unit.
    pub value: TokenAmount,
    /// Start of the validity window (inclusive).
    pub valid_after: UnixTimestamp,
    /// End of the validity window (exclusive).
    pub valid_before: UnixTimestamp,
    /// Payer-chosen 32-byte nonce, unique per `(from, nonce)` pair.
    pub nonce: B256,
}

/// An [`Authorization`] paired with its EIP-712 signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAuthorization {
    /// The signed payment intent.
    pub authorization: Authorization,
    /// 65-byte ECDSA signature (`r || s || v`), hex-encoded on the wire.
    pub signature: Bytes,
}

/// The payment payload submitted to `/verify` and `/settle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    /// ERC-20 token contract the authorization denominates.
    pub token: Address,
    /// The signed authorization.
    pub payload: SignedAuthorization,
}

/// Caller-supplied verification context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// B402 relayer deployment the signature is bound to
    /// (the EIP-712 `verifyingContract`).
    pub relayer_contract: Address,
    /// Network label, echoed in responses. Chain selection itself is fixed
    /// by facilitator configuration, never by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,
}

/// Request body for `POST /verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// The payment payload to verify.
    pub payment_payload: PaymentPayload,
    /// The requirements to verify against.
    pub payment_requirements: PaymentRequirements,
}

/// Request body for `POST /settle`, identical in shape to [`VerifyRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    /// The payment payload to settle.
    pub payment_payload: PaymentPayload,
    /// The requirements for settlement.
    pub payment_requirements: PaymentRequirements,
}

/// Response body for `POST /verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// Whether the authorization passed all checks.
    pub is_valid: bool,
    /// Rejection reason when `is_valid` is `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
    /// Recovered payer address when `is_valid` is `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<Address>,
}

impl VerifyResponse {
    /// A passing verification outcome for `payer`.
    #[must_use]
    pub const fn valid(payer: Address) -> Self {
        Self {
            is_valid: true,
            invalid_reason: None,
            payer: Some(payer),
        }
    }

    /// A failing verification outcome with the given wire reason.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            invalid_reason: Some(reason.into()),
            payer: None,
        }
    }
}

/// Response body for `POST /settle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    /// Whether the relay transaction was mined successfully.
    pub success: bool,
    /// Transaction hash of the relay transaction, when one was mined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TxHash>,
    /// Network the settlement ran against.
    pub network: Network,
    /// Payer whose authorization was executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<Address>,
    /// Block the transaction was included in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Failure reason when `success` is `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl SettleResponse {
    /// A successful settlement outcome.
    #[must_use]
    pub const fn success(
        network: Network,
        payer: Address,
        transaction: TxHash,
        block_number: Option<u64>,
    ) -> Self {
        Self {
            success: true,
            transaction: Some(transaction),
            network,
            payer: Some(payer),
            block_number,
            error_reason: None,
        }
    }

    /// A failed settlement outcome with the given reason.
    #[must_use]
    pub fn failure(network: Network, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction: None,
            network,
            payer: None,
            block_number: None,
            error_reason: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn sample_request_json() -> serde_json::Value {
        serde_json::json!({
            "paymentPayload": {
                "token": "0x55d398326f99059fF775485246999027B3197955",
                "payload": {
                    "authorization": {
                        "from": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
                        "to": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
                        "value": "1000000000000000000",
                        "validAfter": "1700000000",
                        "validBefore": "1700003600",
                        "nonce": "0x0101010101010101010101010101010101010101010101010101010101010101"
                    },
                    "signature": "0x1b2c3d"
                }
            },
            "paymentRequirements": {
                "relayerContract": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                "network": "bsc"
            }
        })
    }

    #[test]
    fn test_verify_request_deserializes() {
        let request: VerifyRequest = serde_json::from_value(sample_request_json()).unwrap();
        let authorization = &request.payment_payload.payload.authorization;
        assert_eq!(
            authorization.from,
            address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        assert_eq!(authorization.value.as_u256(), U256::from(10u64).pow(U256::from(18u64)));
        assert_eq!(authorization.valid_after.as_secs(), 1700000000);
        assert_eq!(request.payment_requirements.network, Some(Network::Bsc));
    }

    #[test]
    fn test_numeric_timestamps_and_value_accepted() {
        let mut json = sample_request_json();
        let authorization =
            &mut json["paymentPayload"]["payload"]["authorization"];
        authorization["validAfter"] = serde_json::json!(1700000000u64);
        authorization["validBefore"] = serde_json::json!(1700003600u64);
        authorization["value"] = serde_json::json!(25u64);

        let request: VerifyRequest = serde_json::from_value(json).unwrap();
        let authorization = &request.payment_payload.payload.authorization;
        assert_eq!(authorization.valid_before.as_secs(), 1700003600);
        assert_eq!(authorization.value, TokenAmount::from(25u64));
    }

    #[test]
    fn test_missing_nonce_is_rejected() {
        let mut json = sample_request_json();
        json["paymentPayload"]["payload"]["authorization"]
            .as_object_mut()
            .unwrap()
            .remove("nonce");
        let result: Result<VerifyRequest, _> = serde_json::from_value(json);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("nonce"), "unexpected error: {message}");
    }

    #[test]
    fn test_malformed_address_is_rejected() {
        let mut json = sample_request_json();
        json["paymentPayload"]["payload"]["authorization"]["from"] = serde_json::json!("");
        let result: Result<VerifyRequest, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_requirements_network_is_optional() {
        let mut json = sample_request_json();
        json["paymentRequirements"]
            .as_object_mut()
            .unwrap()
            .remove("network");
        let request: VerifyRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.payment_requirements.network, None);
    }

    #[test]
    fn test_verify_response_shapes() {
        let payer = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let valid = serde_json::to_value(VerifyResponse::valid(payer)).unwrap();
        assert_eq!(valid["isValid"], serde_json::json!(true));
        assert!(valid.get("invalidReason").is_none());

        let invalid = serde_json::to_value(VerifyResponse::invalid("Invalid signature")).unwrap();
        assert_eq!(invalid["isValid"], serde_json::json!(false));
        assert_eq!(invalid["invalidReason"], serde_json::json!("Invalid signature"));
        assert!(invalid.get("payer").is_none());
    }

    #[test]
    fn test_settle_response_roundtrip() {
        let payer = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let response = SettleResponse::success(
            Network::BscTestnet,
            payer,
            TxHash::with_last_byte(7),
            Some(1234),
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["network"], serde_json::json!("bsc-testnet"));
        assert_eq!(json["blockNumber"], serde_json::json!(1234));
        let parsed: SettleResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, response);
    }

    #[test]
    fn test_token_amount_decimal_string() {
        let amount: TokenAmount = serde_json::from_str("\"123456789\"").unwrap();
        assert_eq!(amount, TokenAmount::from(123456789u64));
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"123456789\"");
    }
}
