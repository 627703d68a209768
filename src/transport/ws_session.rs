use crate::server::GameServer;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

pub async fn handle_socket(socket: WebSocket, server: Arc<GameServer>) {
    let (mut sender, mut receiver) = socket.split();
    let (session_id, mut outbound) = server.connect();

    let send_task = tokio::spawn(async move {
        while let Some(payload) = outbound.recv().await {
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = receiver.next().await {
        let Ok(message) = result else { break };
        match message {
            Message::Text(text) => {
                server.handle_text_message(&session_id, &text).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    server.disconnect(&session_id);
    send_task.abort();
}
