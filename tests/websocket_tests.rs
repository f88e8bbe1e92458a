//! Live WebSocket relay tests: join a wallet room, receive request events.


use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use wallet_gateway::{EventHub, GatewayClient, NewPaymentRequest, RequestStatus};
use test_helpers::{serve, test_app, unreachable_node_url};

async fn wait_for_room(hub: &EventHub, address: &str, members: usize) {
    for _ in 0..200 {
        if hub.room_size(address) == members {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("room for {address} never reached {members} members");
}

async fn next_event<S>(ws: &mut S) -> Value
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("no event within 5s")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_wallet_room_receives_request_events() {
    let (_dir, state, app) = test_app(&unreachable_node_url(), true);
    let base = serve(app).await;
    let ws_url = format!("{}/ws", base.replacen("http", "ws", 1));

    let (mut bob, _) = connect_async(ws_url.as_str()).await.unwrap();
    bob.send(Message::Text(json!({ "event": "wallet:connect", "data": "supBob" }).to_string().into()))
        .await
        .unwrap();
    wait_for_room(&state.events, "supBob", 1).await;

    let client = GatewayClient::new(base, Duration::from_secs(5)).unwrap();
    let request = client
        .create_request(&NewPaymentRequest {
            from_address: "supAlice".into(),
            to_address: "supBob".into(),
            amount: 7.0,
            note: None,
        })
        .await
        .unwrap();

    let event = next_event(&mut bob).await;
    assert_eq!(event["event"], "request:new");
    assert_eq!(event["data"]["id"], request.id);
    assert_eq!(event["data"]["amount"], 7.0);

    client
        .update_request_status(request.id, RequestStatus::Completed, Some("tx-77"))
        .await
        .unwrap();

    let event = next_event(&mut bob).await;
    assert_eq!(event["event"], "request:updated");
    assert_eq!(event["data"]["status"], "completed");
    assert_eq!(event["data"]["transaction_id"], "tx-77");
}

#[tokio::test]
async fn test_disconnect_leaves_rooms() {
    let (_dir, state, app) = test_app(&unreachable_node_url(), true);
    let base = serve(app).await;
    let ws_url = format!("{}/ws", base.replacen("http", "ws", 1));

    let (mut ws, _) = connect_async(ws_url.as_str()).await.unwrap();
    ws.send(Message::Text(json!({ "event": "wallet:connect", "data": "supCarol" }).to_string().into()))
        .await
        .unwrap();
    wait_for_room(&state.events, "supCarol", 1).await;

    ws.close(None).await.unwrap();
    wait_for_room(&state.events, "supCarol", 0).await;
    assert_eq!(state.events.client_count(), 0);
}
