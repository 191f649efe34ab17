//! The live subscription protocol.
//!
//! A client connects to `/ws?token=…`, joins any of its family groups and
//! then receives a `location-update` message every time a member of a
//! joined group submits a position. Closing the connection is the implicit
//! disconnect.

use crate::auth::TokenVerifier;
use crate::config::ServerConfig;
use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use beacon_core::LocationUpdate;
use beacon_live::LocationEngine;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct LiveController {
    engine: Arc<LocationEngine>,
    verifier: Arc<dyn TokenVerifier>,
}

impl LiveController {
    pub fn new(config: &ServerConfig) -> Self {
        Self { engine: config.engine.clone(), verifier: config.verifier.clone() }
    }
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum ClientMessage {
    JoinFamily { family_id: String },
    LeaveFamily { family_id: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum ServerMessage {
    LocationUpdate(LocationUpdate),
    Joined { family_id: String },
    Left { family_id: String },
    Error { message: String },
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(controller): State<LiveController>,
) -> Response {
    let user_id = match controller.verifier.verify(&query.token).await {
        Ok(user_id) => user_id,
        Err(_) => return StatusCode::UNAUTHORIZED.into_response(),
    };
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, controller))
}

async fn handle_socket(socket: WebSocket, user_id: String, controller: LiveController) {
    let session_id = Uuid::new_v4().to_string();
    let mut updates = controller.engine.connect(&session_id, &user_id);
    info!(session_id = %session_id, user_id = %user_id, "live session connected");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(update) => {
                    if send_message(&mut sink, &ServerMessage::LocationUpdate(update))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                // Sender side dropped, the session was disconnected elsewhere.
                None => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let reply = handle_client_message(&text, &session_id, &controller).await;
                    if send_message(&mut sink, &reply).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(session_id = %session_id, error = %err, "websocket error");
                    break;
                }
            },
        }
    }

    // Fully remove the session before the handler returns; afterwards no
    // delivery to it is possible.
    controller.engine.disconnect(&session_id);
    info!(session_id = %session_id, "live session closed");
}

async fn handle_client_message(
    text: &str,
    session_id: &str,
    controller: &LiveController,
) -> ServerMessage {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::JoinFamily { family_id }) => {
            match controller.engine.join(session_id, &family_id).await {
                Ok(()) => ServerMessage::Joined { family_id },
                Err(err) => ServerMessage::Error { message: err.to_string() },
            }
        }
        Ok(ClientMessage::LeaveFamily { family_id }) => {
            controller.engine.leave(session_id, &family_id);
            ServerMessage::Left { family_id }
        }
        Err(err) => ServerMessage::Error { message: format!("invalid message: {err}") },
    }
}

async fn send_message(
    sink: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).map_err(axum::Error::new)?;
    sink.send(Message::Text(json.into())).await
}
