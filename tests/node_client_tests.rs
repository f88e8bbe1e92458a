//! `NodeClient` against a fake node: result unwrapping, error mapping and
//! transport classification.


use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use test_helpers::unreachable_node_url;
use wallet_gateway::rpc::{NodeClient, NodeError};

#[tokio::test]
async fn test_call_unwraps_result() {
    let node = MockServer::start_async().await;
    let status = node
        .mock_async(|when, then| {
            when.method(POST)
                .path("/")
                .header("accept", "application/json")
                .body_contains("\"method\":\"getTransactionStatus\"")
                .body_contains("\"txId\":\"tx-5\"");
            then.status(200)
                .json_body(json!({ "jsonrpc": "2.0", "id": 1, "result": { "status": "confirmed" } }));
        })
        .await;

    let client = NodeClient::new(node.url("/"), Duration::from_secs(2)).unwrap();
    let result = client.get_transaction_status("tx-5").await.unwrap();
    assert_eq!(result["status"], "confirmed");
    status.assert_async().await;
}

#[tokio::test]
async fn test_signing_helpers_send_named_params() {
    let node = MockServer::start_async().await;
    let sign = node
        .mock_async(|when, then| {
            when.method(POST)
                .body_contains("\"method\":\"signTransaction\"")
                .body_contains("\"mnemonic\":\"m\"")
                .body_contains("\"unsignedTransaction\":{\"amount\":1");
            then.status(200).json_body(json!({ "jsonrpc": "2.0", "id": 1, "result": { "signature": "s" } }));
        })
        .await;
    let unsigned = node
        .mock_async(|when, then| {
            when.method(POST)
                .body_contains("\"method\":\"createUnsignedTransaction\"")
                .body_contains("\"gasLimit\":21000");
            then.status(200).json_body(json!({ "jsonrpc": "2.0", "id": 1, "result": { "amount": 1 } }));
        })
        .await;

    let client = NodeClient::new(node.url("/"), Duration::from_secs(2)).unwrap();
    let tx = client
        .create_unsigned_transaction("supA", "supB", 1.0, 20.0, 21000)
        .await
        .unwrap();
    let signed = client.sign_transaction("m", &tx).await.unwrap();
    assert_eq!(signed["signature"], "s");

    unsigned.assert_async().await;
    sign.assert_async().await;
}

#[tokio::test]
async fn test_error_member_becomes_remote_error() {
    let node = MockServer::start_async().await;
    node.mock_async(|when, then| {
        when.method(POST);
        then.status(200).json_body(json!({
            "jsonrpc": "2.0", "id": 1,
            "error": { "code": -7, "message": "unknown block", "data": { "height": 9 } }
        }));
    })
    .await;

    let client = NodeClient::new(node.url("/"), Duration::from_secs(2)).unwrap();
    match client.get_block_count().await.unwrap_err() {
        NodeError::Remote { code, message, data } => {
            assert_eq!(code, -7);
            assert_eq!(message, "unknown block");
            assert_eq!(data, Some(json!({ "height": 9 })));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_http_error_is_upstream() {
    let node = MockServer::start_async().await;
    node.mock_async(|when, then| {
        when.method(POST);
        then.status(502).body("bad gateway");
    })
    .await;

    let client = NodeClient::new(node.url("/"), Duration::from_secs(2)).unwrap();
    match client.get_chain_info().await.unwrap_err() {
        NodeError::Upstream { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, json!("bad gateway"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_body_is_malformed() {
    let node = MockServer::start_async().await;
    node.mock_async(|when, then| {
        when.method(POST);
        then.status(200).body("<html>");
    })
    .await;

    let client = NodeClient::new(node.url("/"), Duration::from_secs(2)).unwrap();
    let err = client.get_pending_transactions().await.unwrap_err();
    assert!(matches!(err, NodeError::Malformed(_)));
}

#[tokio::test]
async fn test_refused_connection_is_unreachable() {
    let client = NodeClient::new(unreachable_node_url(), Duration::from_secs(2)).unwrap();
    let err = client.get_wallet_info("supA").await.unwrap_err();
    assert!(matches!(err, NodeError::ConnectionRefused { .. }), "got {err:?}");
    assert!(err.is_unreachable());
}

#[tokio::test]
async fn test_slow_node_times_out() {
    let node = MockServer::start_async().await;
    node.mock_async(|when, then| {
        when.method(POST);
        then.status(200)
            .delay(Duration::from_millis(500))
            .json_body(json!({ "jsonrpc": "2.0", "id": 1, "result": 1 }));
    })
    .await;

    let client = NodeClient::new(node.url("/"), Duration::from_millis(100)).unwrap();
    let err = client.get_block_count().await.unwrap_err();
    assert!(matches!(err, NodeError::Timeout { .. }), "got {err:?}");
}
