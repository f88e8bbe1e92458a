// ============================================================================
// WEBSOCKET ROUTE - GET /ws
// ============================================================================

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tracing::debug;

use crate::events::{EventFrame, EventHub};
use crate::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_socket(socket, state.events))
}

async fn serve_socket(socket: WebSocket, hub: EventHub) {
    let (client, mut outbound) = hub.register();
    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(_) => continue,
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<EventFrame>(text.as_str()) {
                Ok(frame) => hub.handle_client_frame(client, &frame),
                Err(e) => debug!(client, error = %e, "Ignoring malformed frame"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    hub.disconnect(client);
    writer.abort();
}
