//! End-to-end: `GatewayClient` and `SendFlow` against a served gateway whose
//! node is either httpmock or absent (mock fallback).


use std::time::Duration;

use httpmock::prelude::*;
use serde_json::{json, Value};
use test_helpers::{serve, test_app, unreachable_node_url};
use wallet_gateway::client::{ClientError, PollOutcome, PollPolicy, SendFlow, Stage};
use wallet_gateway::rpc::mock::mock_balance;
use wallet_gateway::{GatewayClient, NewContact, WalletRpc};

fn rpc_result(result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result })
}

async fn client_for(node_url: &str) -> (tempfile::TempDir, GatewayClient) {
    let (dir, _state, app) = test_app(node_url, true);
    let base = serve(app).await;
    (dir, GatewayClient::new(base, Duration::from_secs(5)).unwrap())
}

// ============================================================================
// OFFLINE NODE (MOCK FALLBACK)
// ============================================================================

#[tokio::test]
async fn test_offline_wallet_creation_and_balance() {
    let (_dir, client) = client_for(&unreachable_node_url()).await;

    let wallet = client.create_wallet().await.unwrap();
    let address = wallet["address"].as_str().unwrap().to_string();
    assert!(address.starts_with("supc"));
    assert_eq!(wallet["mnemonic"].as_str().unwrap().split(' ').count(), 12);

    let balance = client.get_balance(&address).await.unwrap();
    assert_eq!(balance, mock_balance(&address) as f64);

    let history = client.get_transaction_history(&address, 5, 10).await.unwrap();
    let txs = history["transactions"].as_array().unwrap();
    assert_eq!(txs.len(), 5);
    assert_eq!(txs[0]["nonce"], 0);
    assert_eq!(txs[0]["to"], address.as_str());
    assert_eq!(txs[1]["from"], address.as_str());
}

#[tokio::test]
async fn test_offline_unmockable_call_is_rpc_error() {
    let (_dir, client) = client_for(&unreachable_node_url()).await;
    let err = client.get_transaction_status("tx-1").await.unwrap_err();
    match err {
        ClientError::Rpc { code, message, .. } => {
            assert_eq!(code, -32603);
            assert_eq!(message, "Failed to connect to blockchain node");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ============================================================================
// REST HELPERS
// ============================================================================

#[tokio::test]
async fn test_contact_helpers_round_trip_through_server() {
    let (_dir, client) = client_for(&unreachable_node_url()).await;

    let bob = client.add_contact(&NewContact::new("Bob", "supBob", None)).await.unwrap();
    client.add_contact(&NewContact::new("Alice", "supAlice", Some("sister".into()))).await.unwrap();

    let names: Vec<String> = client.list_contacts().await.unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);

    let hits = client.search_contacts("sup b").await.unwrap();
    assert!(hits.is_empty());
    let hits = client.search_contacts("bob").await.unwrap();
    assert_eq!(hits.len(), 1);

    let err = client.add_contact(&NewContact::new("Bobby", "supBob", None)).await.unwrap_err();
    assert!(matches!(err, ClientError::Http { status: 409, .. }));

    client.delete_contact(bob.id).await.unwrap();
    let err = client.get_contact(bob.id).await.unwrap_err();
    match err {
        ClientError::Http { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Contact not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ============================================================================
// SEND FLOW
// ============================================================================

#[tokio::test]
async fn test_send_flow_against_node() {
    let node = MockServer::start_async().await;
    node.mock_async(|when, then| {
        when.method(POST).body_contains("\"method\":\"estimateFee\"");
        then.status(200).json_body(rpc_result(json!({ "fee": 0.002, "gasPrice": 22 })));
    })
    .await;
    let create = node
        .mock_async(|when, then| {
            when.method(POST)
                .body_contains("\"method\":\"createUnsignedTransaction\"")
                .body_contains("\"gasPrice\":22.0")
                .body_contains("\"gasLimit\":21000");
            then.status(200).json_body(rpc_result(json!({ "from": "supAlice", "to": "supBob", "amount": 4.0 })));
        })
        .await;
    node.mock_async(|when, then| {
        when.method(POST).body_contains("\"method\":\"signTransaction\"");
        then.status(200).json_body(rpc_result(json!({
            "transaction": {
                "Sender": "supAlice", "Receiver": "supBob", "Amount": 4.0,
                "GasPrice": 22, "GasLimit": 21000, "Timestamp": 1700000000, "Nonce": 3
            },
            "signature": "deadbeef",
            "senderPubKey": "0xpub",
            "transactionId": "tx-e2e"
        })));
    })
    .await;
    let broadcast = node
        .mock_async(|when, then| {
            when.method(POST)
                .body_contains("\"method\":\"sendTransaction\"")
                .body_contains("\"publicKey\":\"0xpub\"")
                .body_contains("\"nonce\":3");
            then.status(200).json_body(rpc_result(json!({ "transactionId": "tx-e2e", "status": "pending" })));
        })
        .await;
    node.mock_async(|when, then| {
        when.method(POST).body_contains("\"method\":\"getTransactionStatus\"");
        then.status(200).json_body(rpc_result(json!({ "txId": "tx-e2e", "status": "confirmed" })));
    })
    .await;

    let (_dir, client) = client_for(&node.url("/")).await;
    let mut flow = SendFlow::new(client, "supAlice")
        .with_balance(10.0)
        .with_poll_policy(PollPolicy { interval: Duration::from_millis(5), max_attempts: 3 });

    let fee = flow.estimate("supBob", 4.0).await.unwrap().clone();
    assert_eq!(fee.fee, 0.002);
    assert_eq!(fee.gas_limit, 21000);
    assert_eq!(flow.stage(), Stage::FeeConfirmation);

    flow.confirm_fee().await.unwrap();
    assert_eq!(flow.stage(), Stage::TransactionReview);
    flow.confirm_review().unwrap();

    let tx_id = flow.sign_and_send("twelve word phrase").await.unwrap().to_string();
    assert_eq!(tx_id, "tx-e2e");
    assert_eq!(flow.stage(), Stage::Processing);

    let outcome = flow.track().await.unwrap();
    assert!(matches!(outcome, PollOutcome::Confirmed(_)));
    assert_eq!(flow.stage(), Stage::Complete);

    create.assert_async().await;
    broadcast.assert_async().await;
}

#[tokio::test]
async fn test_send_flow_times_out_on_pending_transaction() {
    let node = MockServer::start_async().await;
    let status = node
        .mock_async(|when, then| {
            when.method(POST).body_contains("\"method\":\"getTransactionStatus\"");
            then.status(200).json_body(rpc_result(json!({ "status": "pending" })));
        })
        .await;
    node.mock_async(|when, then| {
        when.method(POST).body_contains("\"method\":\"sendTransactionWithKey\"");
        then.status(200).json_body(rpc_result(json!({ "transactionId": "tx-slow" })));
    })
    .await;

    let (_dir, client) = client_for(&node.url("/")).await;
    let mut flow = SendFlow::new(client, "supAlice")
        .with_poll_policy(PollPolicy { interval: Duration::from_millis(5), max_attempts: 4 });

    flow.send_with_key("supBob", 1.0, "phrase").await.unwrap();
    let outcome = flow.track().await.unwrap();
    assert_eq!(*outcome, PollOutcome::Timeout);
    status.assert_hits_async(4).await;
}
