use futures_util::{Sink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::error::Result;
use crate::pomodoro::{Mode, Settings};
use crate::session::{SessionEvent, SessionHandle};

/// Request sent by a UI client.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Start,
    Pause,
    Toggle,
    Reset,
    SwitchMode { mode: Mode },
    UpdateSettings { settings: Settings },
    /// Ask for the current state without changing it
    State,
}

#[derive(Debug, Serialize)]
pub struct WebSocketResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl WebSocketResponse {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
        }
    }
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    let listener = TcpListener::bind(&addr).await?;
    log::info!("WebSocket server listening on: {}", listener.local_addr()?);
    Ok(listener)
}

/// Accept clients until the listener fails.
pub async fn serve(listener: TcpListener, session: SessionHandle) -> Result<()> {
    while let Ok((stream, peer_addr)) = listener.accept().await {
        log::info!("New WebSocket connection from: {}", peer_addr);
        tokio::spawn(handle_connection(stream, peer_addr, session.clone()));
    }

    Ok(())
}

pub async fn start_websocket_server(addr: SocketAddr, session: SessionHandle) -> Result<()> {
    let listener = bind(addr).await?;
    serve(listener, session).await
}

async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, session: SessionHandle) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            log::warn!("WebSocket handshake failed with {}: {}", peer_addr, e);
            return;
        }
    };

    log::debug!("WebSocket handshake completed with {}", peer_addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let mut events = session.subscribe();

    loop {
        tokio::select! {
            msg = ws_receiver.next() => {
                let Some(msg) = msg else { break };
                match msg {
                    Ok(Message::Text(text)) => {
                        let (response, state) = handle_request(&text, &session).await;
                        if !send_json(&mut ws_sender, &response).await {
                            break;
                        }
                        if let Some(event) = state {
                            if !send_json(&mut ws_sender, &event).await {
                                break;
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        log::info!("WebSocket connection closed by {}", peer_addr);
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if let Err(e) = ws_sender.send(Message::Pong(data)).await {
                            log::warn!("Failed to send pong: {}", e);
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        log::warn!("WebSocket error from {}: {}", peer_addr, e);
                        break;
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if !send_json(&mut ws_sender, &event).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::debug!("Client {} lagged by {} events", peer_addr, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    log::info!("WebSocket connection with {} terminated", peer_addr);
}

/// Apply one client request. Returns the response plus, for `state`
/// requests, the snapshot to push back.
async fn handle_request(
    text: &str,
    session: &SessionHandle,
) -> (WebSocketResponse, Option<SessionEvent>) {
    let request = match serde_json::from_str::<ClientMessage>(text) {
        Ok(request) => request,
        Err(e) => {
            log::warn!("Failed to parse message: {}", e);
            return (WebSocketResponse::error(format!("Parse error: {}", e)), None);
        }
    };
    log::debug!("[WebSocket] Received: {:?}", request);

    let applied = match request {
        ClientMessage::Start => session.start(),
        ClientMessage::Pause => session.pause(),
        ClientMessage::Toggle => session.toggle(),
        ClientMessage::Reset => session.reset(),
        ClientMessage::SwitchMode { mode } => session.switch_mode(mode),
        ClientMessage::UpdateSettings { settings } => match settings.validate() {
            Ok(()) => session.update_settings(settings),
            Err(e) => return (WebSocketResponse::error(e.to_string()), None),
        },
        ClientMessage::State => {
            return match session.snapshot().await {
                Ok(snapshot) => (
                    WebSocketResponse::ok("Current state"),
                    Some(SessionEvent::State(snapshot)),
                ),
                Err(e) => (WebSocketResponse::error(e.to_string()), None),
            };
        }
    };

    match applied {
        Ok(()) => (WebSocketResponse::ok("Command accepted"), None),
        Err(e) => (WebSocketResponse::error(e.to_string()), None),
    }
}

/// Serialize and send one frame. Returns false once the client is gone.
async fn send_json<S, T>(sink: &mut S, value: &T) -> bool
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
    T: Serialize,
{
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            log::error!("Failed to serialize WebSocket payload: {}", e);
            return true;
        }
    };
    match sink.send(Message::Text(json)).await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to send WebSocket message: {}", e);
            false
        }
    }
}
