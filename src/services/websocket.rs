use axum::{
    extract::{Extension, ws::{WebSocket, WebSocketUpgrade, Message}},
    response::IntoResponse,
};
use tokio::sync::broadcast;
use tracing::{debug, error};
use crate::dto::render_dto::{RenderPlan, UpdateRender};
use futures_util::{StreamExt, SinkExt};

/// Broadcasts the public part of a plan. Called after the lobby lock is
/// released; a failed send never touches the draft.
pub fn send_render_plan(tx: &broadcast::Sender<String>, plan: &RenderPlan) {
    let public = plan.public();
    if public.is_empty() {
        return;
    }

    let update_msg = UpdateRender {
        r#type: "render_plan".to_string(),
        instructions: public.instructions,
    };

    match serde_json::to_string(&update_msg) {
        Ok(json) => {
            if tx.send(json).is_err() {
                debug!("No websocket subscribers for render plan.");
            }
        }
        Err(e) => {
            error!("Failed to serialize render plan: {}", e);
        }
    }
}

/* Web Socket stuff */
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Extension(tx): Extension<broadcast::Sender<String>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, tx))
}

async fn handle_socket(socket: WebSocket, tx: broadcast::Sender<String>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = tx.subscribe();

    // Task to send render plans to this client
    let send_task = tokio::spawn(async move {
        while let Ok(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Clients only listen; drain until they hang up.
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Close(_) = msg {
            break;
        }
    }

    send_task.abort();
}
