//! Tests for the best-effort event log sink.

use std::time::Duration;

use alloy_primitives::{B256, address};
use b402_facilitator::events::{EventLog, VerifyRecord, unix_now};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_record() -> VerifyRecord {
    VerifyRecord {
        payer: address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
        recipient: address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8"),
        token: address!("0x337610d27c682E347C9cD60BD4b3b107C9d34dDd"),
        token_symbol: "USDT".to_owned(),
        amount: "1000000".to_owned(),
        amount_formatted: "1.0".to_owned(),
        nonce: B256::repeat_byte(0x77),
        network: "bsc-testnet".to_owned(),
        chain_id: 97,
        is_valid: true,
        invalid_reason: None,
        timestamp: unix_now(),
        duration_ms: 12,
    }
}

async fn wait_for_requests(server: &MockServer, count: usize) {
    for _ in 0..100 {
        let received = server.received_requests().await.unwrap_or_default();
        if received.len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_verify_record_is_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify_requests"))
        .and(header("apikey", "sekrit"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let log = EventLog::new(
        Some(server.uri().parse().unwrap()),
        Some("sekrit".to_owned()),
    );
    log.record_verify(sample_record());
    wait_for_requests(&server, 1).await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let row: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(row["token_symbol"], serde_json::json!("USDT"));
    assert_eq!(row["chain_id"], serde_json::json!(97));
    assert_eq!(row["is_valid"], serde_json::json!(true));
    assert_eq!(row["amount_formatted"], serde_json::json!("1.0"));
}

#[tokio::test]
async fn test_sink_failure_is_swallowed() {
    // Endpoint that always refuses: recording must not panic or error.
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let log = EventLog::new(Some(server.uri().parse().unwrap()), None);
    log.record_verify(sample_record());
    wait_for_requests(&server, 1).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_disabled_sink_records_nothing() {
    let log = EventLog::disabled();
    // No endpoint configured: a record is a no-op, not an error.
    log.record_verify(sample_record());
}
