//! Best-effort structured event log.
//!
//! Every verify and settle outcome is recorded as a row and POSTed
//! fire-and-forget to an optional Supabase-style REST endpoint. Delivery is
//! never on the request path: serialization happens inline, the POST runs in
//! a spawned task, and any failure is reported to operator logs only.

use alloy_primitives::{Address, B256, TxHash};
use serde::Serialize;
use std::time::{Duration, SystemTime};
use url::Url;

/// Row recorded for each `/verify` request that reached validation.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyRecord {
    /// Payer account from the authorization.
    pub payer: Address,
    /// Payee account from the authorization.
    pub recipient: Address,
    /// Token contract the authorization denominates.
    pub token: Address,
    /// Resolved token symbol.
    pub token_symbol: String,
    /// Raw amount in token units.
    pub amount: String,
    /// Amount scaled by the token's decimals.
    pub amount_formatted: String,
    /// Authorization nonce.
    pub nonce: B256,
    /// Network label.
    pub network: String,
    /// Numeric chain id.
    pub chain_id: u64,
    /// Verification outcome.
    pub is_valid: bool,
    /// Rejection reason, when invalid.
    pub invalid_reason: Option<String>,
    /// Unix seconds when the record was produced.
    pub timestamp: u64,
    /// Request handling time in milliseconds.
    pub duration_ms: u64,
}

/// Row recorded for each `/settle` attempt.
#[derive(Debug, Clone, Serialize)]
pub struct SettleRecord {
    /// Hash of the mined transaction, when one exists.
    pub transaction_hash: Option<TxHash>,
    /// Payer account from the authorization.
    pub payer: Address,
    /// Payee account from the authorization.
    pub recipient: Address,
    /// Token contract the authorization denominates.
    pub token: Address,
    /// Resolved token symbol.
    pub token_symbol: String,
    /// Raw amount in token units.
    pub amount: String,
    /// Amount scaled by the token's decimals.
    pub amount_formatted: String,
    /// Authorization nonce.
    pub nonce: B256,
    /// Network label.
    pub network: String,
    /// Numeric chain id.
    pub chain_id: u64,
    /// Block the transaction landed in.
    pub block_number: Option<u64>,
    /// Gas consumed by the transaction.
    pub gas_used: Option<u64>,
    /// Effective gas price paid, in wei.
    pub gas_price: Option<String>,
    /// Settlement outcome.
    pub success: bool,
    /// Failure reason, when unsuccessful.
    pub error_reason: Option<String>,
    /// Submission-to-confirmation time in milliseconds.
    pub transaction_time_ms: Option<u64>,
    /// End-to-end request time in milliseconds.
    pub total_time_ms: u64,
    /// Unix seconds when the record was produced.
    pub timestamp: u64,
}

/// Returns the current time as Unix seconds for event rows.
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Fire-and-forget sink for verify/settle records.
///
/// With no endpoint configured, recording is a no-op; the facilitator works
/// identically with and without the sink.
#[derive(Debug, Clone)]
pub struct EventLog {
    client: reqwest::Client,
    endpoint: Option<Url>,
    api_key: Option<String>,
}

impl EventLog {
    /// Creates a sink posting to `endpoint`, or a disabled sink when `None`.
    #[must_use]
    pub fn new(endpoint: Option<Url>, api_key: Option<String>) -> Self {
        if endpoint.is_none() {
            tracing::warn!("event log endpoint not configured, event logging disabled");
        }
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }

    /// A sink that records nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: None,
            api_key: None,
        }
    }

    /// Records one verify outcome.
    pub fn record_verify(&self, record: VerifyRecord) {
        self.insert("verify_requests", &record);
    }

    /// Records one settle outcome.
    pub fn record_settle(&self, record: SettleRecord) {
        self.insert("settle_transactions", &record);
    }

    fn insert<T: Serialize>(&self, table: &'static str, row: &T) {
        let Some(endpoint) = &self.endpoint else {
            return;
        };
        let body = match serde_json::to_vec(row) {
            Ok(body) => body,
            Err(error) => {
                tracing::error!(%error, table, "failed to serialize event record");
                return;
            }
        };
        let url = format!("{}/{table}", endpoint.as_str().trim_end_matches('/'));
        let mut request = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .timeout(Duration::from_secs(5))
            .body(body);
        if let Some(key) = &self.api_key {
            request = request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {key}"));
        }
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(table, "event record delivered");
                }
                Ok(response) => {
                    tracing::warn!(table, status = %response.status(), "event sink rejected record");
                }
                Err(error) => {
                    tracing::warn!(table, %error, "event record delivery failed");
                }
            }
        });
    }
}
