//! WebSocket connection handling
//!
//! One task per connection: send the peer its identity, read envelopes until
//! the connection ends, then run the disconnect cleanup exactly once.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, Stream, StreamExt};
use serde::Serialize;
use sigrelay_core::{
    Client, ClientId, Envelope, MessageType, Outbound, ServerMessage, Session, SessionStore,
    TransportError, classify,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::router::{RouteError, route};
use crate::AppState;

/// Reasons a connection ends that are worth reporting
#[derive(Debug, Error)]
enum ConnectionError {
    #[error("send identity: {0}")]
    Identity(#[source] TransportError),

    #[error("read message: {0}")]
    Read(#[source] axum::Error),

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Write half of an axum WebSocket
struct WsOutbound(SplitSink<WebSocket, Message>);

#[async_trait]
impl Outbound for WsOutbound {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.0
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.0
            .close()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

/// WebSocket upgrade handler
///
/// Any origin is accepted.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_agent))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_agent: String) {
    let (sender, receiver) = socket.split();
    let (device_type, device_name) = classify(&user_agent);
    let client = Arc::new(Client::new(
        device_type,
        device_name,
        Box::new(WsOutbound(sender)),
    ));

    info!(client_id = %client.id(), "WebSocket client connected");

    match serve_client(&client, receiver, &state).await {
        Ok(()) => {}
        // A peer speaking an unknown protocol is closed without noise
        Err(ConnectionError::Route(RouteError::UnknownMessageType(kind))) => {
            debug!(client_id = %client.id(), "Closing connection on unknown message type {:?}", kind);
        }
        Err(e) => error!(client_id = %client.id(), "WebSocket handler: {}", e),
    }

    disconnect(&client, &state.sessions).await;

    info!(client_id = %client.id(), "WebSocket client disconnected");
}

/// Identity handshake followed by the read loop
async fn serve_client<S>(
    client: &Arc<Client>,
    mut receiver: S,
    state: &AppState,
) -> Result<(), ConnectionError>
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    client
        .send(&ServerMessage::new(MessageType::Identity, client.info()))
        .await
        .map_err(ConnectionError::Identity)?;

    loop {
        let Some(next) = next_frame(&mut receiver, state.idle_timeout).await else {
            info!(client_id = %client.id(), "Closing idle connection");
            return Ok(());
        };

        let text = match next {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    warn!(client_id = %client.id(), "Dropping non UTF-8 binary frame");
                    continue;
                }
            },
            Some(Ok(Message::Close(_))) | None => {
                debug!(client_id = %client.id(), "WebSocket client sent close frame");
                return Ok(());
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) if is_expected_disconnect(&e) => {
                debug!(client_id = %client.id(), "Connection dropped: {}", e);
                return Ok(());
            }
            Some(Err(e)) => return Err(ConnectionError::Read(e)),
        };

        let envelope = match Envelope::parse(&text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(client_id = %client.id(), "Dropping malformed message: {}", e);
                continue;
            }
        };

        route(client, &envelope, &text, &state.sessions).await?;
    }
}

/// Wait for the next frame; the outer `None` means the idle timeout elapsed
async fn next_frame<S>(
    receiver: &mut S,
    idle_timeout: Option<Duration>,
) -> Option<Option<Result<Message, axum::Error>>>
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, receiver.next()).await.ok(),
        None => Some(receiver.next().await),
    }
}

/// Read errors that just mean the peer went away without a close handshake
fn is_expected_disconnect(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<io::Error>()
            && matches!(
                io.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            )
        {
            return true;
        }
        source = e.source();
    }

    // axum does not re-export its tungstenite error type, so protocol-level
    // closes can only be recognized by their messages. A rewording upstream
    // turns these into logged errors rather than debug lines.
    const EXPECTED: &[&str] = &[
        "Connection reset without closing handshake",
        "Connection closed normally",
        "Trying to work with closed connection",
    ];
    let message = err.to_string();
    EXPECTED.iter().any(|expected| message.contains(expected))
}

/// Disconnect cleanup: close the connection and release the client's session
async fn disconnect(client: &Arc<Client>, sessions: &SessionStore) {
    if let Err(e) = client.close().await {
        debug!(client_id = %client.id(), "Close connection: {}", e);
    }
    leave_current_session(client, sessions).await;
}

/// Remove `client` from the session it is affiliated with, if any
///
/// A departing host disbands the session. A departing guest is announced to
/// the remaining member with `client-left` followed by `session-info`. A
/// session that is already gone is not an error.
pub(super) async fn leave_current_session(client: &Arc<Client>, sessions: &SessionStore) {
    let Some(code) = client.session_id() else {
        return;
    };
    let Ok(session) = sessions.get(&code).await else {
        return;
    };

    let departure = session.remove_client(client).await;
    if departure.was_host {
        info!(client_id = %client.id(), "Host left, closing session {}", session.id());
        disband(&session, sessions).await;
    } else if departure.removed {
        broadcast(
            &session,
            &ServerMessage::new(MessageType::ClientLeft, client.info()),
            Some(client.id()),
        )
        .await;
        broadcast(
            &session,
            &ServerMessage::new(MessageType::SessionInfo, session.snapshot().await),
            Some(client.id()),
        )
        .await;
    }
}

/// Tell the remaining members the session is over and remove it from the store
pub(super) async fn disband(session: &Session, sessions: &SessionStore) {
    let snapshot = session.snapshot().await;
    broadcast(
        session,
        &ServerMessage::new(MessageType::SessionLeft, &snapshot),
        None,
    )
    .await;
    session.release_members().await;
    sessions.delete(session.id()).await;
}

/// Send `msg` to every member of `session` except `except`
///
/// Delivery failures are logged and do not affect the other members.
pub(super) async fn broadcast<T: Serialize>(
    session: &Session,
    msg: &ServerMessage<T>,
    except: Option<ClientId>,
) {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to encode {} broadcast: {}", msg.kind.as_str(), e);
            return;
        }
    };

    for member in session.members().await {
        if Some(member.id()) == except {
            continue;
        }
        if let Err(e) = member.send_text(json.clone()).await {
            warn!(
                client_id = %member.id(),
                "Broadcast of {} failed: {}",
                msg.kind.as_str(),
                e
            );
        }
    }
}
