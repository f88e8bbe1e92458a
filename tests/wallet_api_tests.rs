//! `/api/wallet` REST facade tests against a fake node.


use axum::http::{Method, StatusCode};
use httpmock::prelude::*;
use serde_json::json;
use test_helpers::{send, test_app, unreachable_node_url};

fn rpc_result(result: serde_json::Value) -> serde_json::Value {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result })
}

#[tokio::test]
async fn test_create_wallet_returns_201() {
    let node = MockServer::start_async().await;
    node.mock_async(|when, then| {
        when.method(POST).body_contains("\"method\":\"createWallet\"");
        then.status(200).json_body(rpc_result(json!({ "address": "supNew", "mnemonic": "a b c" })));
    })
    .await;

    let (_dir, _state, app) = test_app(&node.url("/"), true);
    let (status, body) = send(&app, Method::POST, "/api/wallet/create", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["address"], "supNew");
}

#[tokio::test]
async fn test_import_requires_mnemonic() {
    let (_dir, _state, app) = test_app(&unreachable_node_url(), true);
    let (status, body) = send(&app, Method::POST, "/api/wallet/import", Some(json!({ "mnemonic": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Mnemonic phrase is required");
}

#[tokio::test]
async fn test_balance_routes_wrap_address() {
    let node = MockServer::start_async().await;
    let balance = node
        .mock_async(|when, then| {
            when.method(POST)
                .body_contains("\"method\":\"getBalance\"")
                .body_contains("\"address\":\"supAlice\"");
            then.status(200).json_body(rpc_result(json!(250)));
        })
        .await;

    let (_dir, _state, app) = test_app(&node.url("/"), true);
    for uri in ["/api/wallet/supAlice", "/api/wallet/supAlice/balance"] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "address": "supAlice", "balance": 250 }));
    }
    balance.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_transactions_use_default_paging() {
    let node = MockServer::start_async().await;
    let history = node
        .mock_async(|when, then| {
            when.method(POST)
                .body_contains("\"method\":\"getTransactionHistory\"")
                .body_contains("\"limit\":20")
                .body_contains("\"offset\":0");
            then.status(200).json_body(rpc_result(json!({ "transactions": [], "total": 0 })));
        })
        .await;

    let (_dir, _state, app) = test_app(&node.url("/"), true);
    let (status, body) = send(&app, Method::GET, "/api/wallet/supAlice/transactions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    history.assert_async().await;
}

#[tokio::test]
async fn test_send_fills_gas_from_estimate() {
    let node = MockServer::start_async().await;
    node.mock_async(|when, then| {
        when.method(POST).body_contains("\"method\":\"estimateFee\"");
        then.status(200)
            .json_body(rpc_result(json!({ "fee": 0.001, "gasPrice": 30, "gasLimit": 25000 })));
    })
    .await;
    let submit = node
        .mock_async(|when, then| {
            when.method(POST)
                .body_contains("\"method\":\"sendTransaction\"")
                .body_contains("\"gasPrice\":30.0")
                .body_contains("\"gasLimit\":25000");
            then.status(200).json_body(rpc_result(json!({ "transactionId": "tx-9", "status": "pending" })));
        })
        .await;

    let (_dir, _state, app) = test_app(&node.url("/"), true);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/wallet/send",
        Some(json!({ "from": "supAlice", "to": "supBob", "amount": 3 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactionId"], "tx-9");
    submit.assert_async().await;
}

#[tokio::test]
async fn test_send_treats_zero_gas_as_missing() {
    let node = MockServer::start_async().await;
    let estimate = node
        .mock_async(|when, then| {
            when.method(POST).body_contains("\"method\":\"estimateFee\"");
            then.status(200)
                .json_body(rpc_result(json!({ "fee": 0.001, "gasPrice": 30, "gasLimit": 25000 })));
        })
        .await;
    let submit = node
        .mock_async(|when, then| {
            when.method(POST)
                .body_contains("\"method\":\"sendTransaction\"")
                .body_contains("\"gasPrice\":30.0")
                .body_contains("\"gasLimit\":25000");
            then.status(200).json_body(rpc_result(json!({ "transactionId": "tx-11" })));
        })
        .await;

    let (_dir, _state, app) = test_app(&node.url("/"), true);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/wallet/send",
        Some(json!({ "from": "supAlice", "to": "supBob", "amount": 1, "gasPrice": 0, "gasLimit": 0 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactionId"], "tx-11");
    estimate.assert_async().await;
    submit.assert_async().await;
}

#[tokio::test]
async fn test_send_keeps_explicit_gas() {
    let node = MockServer::start_async().await;
    let estimate = node
        .mock_async(|when, then| {
            when.method(POST).body_contains("\"method\":\"estimateFee\"");
            then.status(200).json_body(rpc_result(json!({ "gasPrice": 30, "gasLimit": 25000 })));
        })
        .await;
    let submit = node
        .mock_async(|when, then| {
            when.method(POST)
                .body_contains("\"method\":\"sendTransaction\"")
                .body_contains("\"gasPrice\":12.5")
                .body_contains("\"gasLimit\":30000");
            then.status(200).json_body(rpc_result(json!({ "transactionId": "tx-12" })));
        })
        .await;

    let (_dir, _state, app) = test_app(&node.url("/"), true);
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/wallet/send",
        Some(json!({ "from": "supAlice", "to": "supBob", "amount": 1, "gasPrice": 12.5, "gasLimit": 30000 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    estimate.assert_hits_async(0).await;
    submit.assert_async().await;
}

#[tokio::test]
async fn test_send_survives_failed_estimate() {
    let node = MockServer::start_async().await;
    node.mock_async(|when, then| {
        when.method(POST).body_contains("\"method\":\"estimateFee\"");
        then.status(200)
            .json_body(json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": -1, "message": "busy" } }));
    })
    .await;
    let submit = node
        .mock_async(|when, then| {
            when.method(POST)
                .body_contains("\"method\":\"sendTransaction\"")
                .body_contains("\"gasPrice\":null");
            then.status(200).json_body(rpc_result(json!({ "transactionId": "tx-10" })));
        })
        .await;

    let (_dir, _state, app) = test_app(&node.url("/"), true);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/wallet/send",
        Some(json!({ "from": "supAlice", "to": "supBob", "amount": 3 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactionId"], "tx-10");
    submit.assert_async().await;
}

#[tokio::test]
async fn test_send_validation() {
    let (_dir, _state, app) = test_app(&unreachable_node_url(), true);
    let (status, body) =
        send(&app, Method::POST, "/api/wallet/send", Some(json!({ "from": "supAlice", "amount": 3 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "From address, to address, and amount are required");
}

#[tokio::test]
async fn test_node_failure_is_500() {
    let (_dir, _state, app) = test_app(&unreachable_node_url(), true);
    let (status, body) = send(&app, Method::GET, "/api/wallet/supAlice/balance", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("Cannot connect"));
}
