//! Session protocol: dispatch of inbound envelopes
//!
//! Every operation runs on the calling connection's task. Replies go straight
//! to the requesting client; notifications to the other peer go through
//! [`broadcast`].

use std::sync::Arc;

use sigrelay_core::{
    Client, Envelope, ErrorCode, JoinOutcome, MessageType, RtcRouting, ServerMessage, Session,
    SessionError, SessionIdPayload, SessionStore, TransportError,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::connection::{broadcast, disband, leave_current_session};

/// Outcome of routing one envelope that ends the connection
#[derive(Debug, Error)]
pub enum RouteError {
    /// The envelope type is not part of the client protocol
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    /// A reply to the requesting client could not be written
    #[error("write reply: {0}")]
    Transport(#[from] TransportError),
}

/// Dispatch one decoded envelope
///
/// `raw` is the frame the envelope was decoded from; signaling messages are
/// forwarded as that exact text.
pub async fn route(
    client: &Arc<Client>,
    envelope: &Envelope,
    raw: &str,
    sessions: &SessionStore,
) -> Result<(), RouteError> {
    let Some(kind) = envelope.message_type() else {
        return Err(RouteError::UnknownMessageType(envelope.kind.clone()));
    };
    debug!(client_id = %client.id(), "Received {}", kind.as_str());

    match kind {
        MessageType::RequestSession => request_session(client, sessions).await,
        MessageType::JoinSession => join_session(client, envelope, sessions).await,
        MessageType::LeaveSession => leave_session(client, envelope, sessions).await,
        kind if kind.is_signaling() => {
            relay(client, kind, envelope, raw, sessions).await;
            Ok(())
        }
        // Server-to-client types are not valid requests
        _ => Err(RouteError::UnknownMessageType(envelope.kind.clone())),
    }
}

async fn request_session(client: &Arc<Client>, sessions: &SessionStore) -> Result<(), RouteError> {
    leave_current_session(client, sessions).await;

    let session = match sessions.create().await {
        Ok(session) => session,
        Err(e) => {
            warn!("Failed to create session: {}", e);
            return reply_error(client, &e).await;
        }
    };
    if let Err(e) = session.add_client(client).await {
        sessions.delete(session.id()).await;
        return reply_error(client, &e).await;
    }

    info!(client_id = %client.id(), "Session {} created", session.id());
    client
        .send(&ServerMessage::new(
            MessageType::SessionCreated,
            session.snapshot().await,
        ))
        .await?;
    Ok(())
}

async fn join_session(
    client: &Arc<Client>,
    envelope: &Envelope,
    sessions: &SessionStore,
) -> Result<(), RouteError> {
    let Some(payload) = session_id_payload(client, envelope).await? else {
        return Ok(());
    };
    let session = match sessions.get(&payload.session_id).await {
        Ok(session) => session,
        Err(e) => return reply_error(client, &e).await,
    };

    if client
        .session_id()
        .is_some_and(|current| current != session.id())
    {
        leave_current_session(client, sessions).await;
    }

    match session.add_client(client).await {
        Ok(JoinOutcome::AlreadyMember) => {
            client
                .send(&ServerMessage::new(
                    MessageType::SessionJoined,
                    session.snapshot().await,
                ))
                .await?;
        }
        Ok(JoinOutcome::Added) => {
            info!(client_id = %client.id(), "Joined session {}", session.id());
            let snapshot = session.snapshot().await;
            client
                .send(&ServerMessage::new(MessageType::SessionJoined, &snapshot))
                .await?;
            broadcast(
                &session,
                &ServerMessage::new(MessageType::SessionInfo, &snapshot),
                Some(client.id()),
            )
            .await;
            broadcast(
                &session,
                &ServerMessage::new(MessageType::ClientJoined, client.info()),
                Some(client.id()),
            )
            .await;
        }
        Err(e) => {
            debug!(client_id = %client.id(), "Join rejected: {}", e);
            reply_error(client, &e).await?;
        }
    }
    Ok(())
}

async fn leave_session(
    client: &Arc<Client>,
    envelope: &Envelope,
    sessions: &SessionStore,
) -> Result<(), RouteError> {
    let Some(payload) = session_id_payload(client, envelope).await? else {
        return Ok(());
    };
    let session = match sessions.get(&payload.session_id).await {
        Ok(session) => session,
        Err(e) => return reply_error(client, &e).await,
    };

    let departure = session.remove_client(client).await;
    let snapshot = session.snapshot().await;
    client
        .send(&ServerMessage::new(MessageType::SessionLeft, &snapshot))
        .await?;

    if !departure.removed {
        return Ok(());
    }
    info!(client_id = %client.id(), "Left session {}", session.id());

    if departure.was_host {
        disband(&session, sessions).await;
    } else {
        broadcast(
            &session,
            &ServerMessage::new(MessageType::SessionInfo, &snapshot),
            Some(client.id()),
        )
        .await;
        broadcast(
            &session,
            &ServerMessage::new(MessageType::ClientLeft, client.info()),
            Some(client.id()),
        )
        .await;
    }
    Ok(())
}

/// Forward a signaling frame unmodified to the peer named in `to`
///
/// Anything that cannot be delivered is logged and dropped; the sender's
/// connection is unaffected.
async fn relay(
    client: &Client,
    kind: MessageType,
    envelope: &Envelope,
    raw: &str,
    sessions: &SessionStore,
) {
    let routing: RtcRouting = match envelope.decode_payload() {
        Ok(routing) => routing,
        Err(e) => {
            warn!(client_id = %client.id(), "Dropping {} without routing info: {}", kind.as_str(), e);
            return;
        }
    };
    let session = match sessions.get(&routing.session_id).await {
        Ok(session) => session,
        Err(e) => {
            warn!(client_id = %client.id(), "Dropping {}: {}", kind.as_str(), e);
            return;
        }
    };
    let Some(recipient) = find_recipient(&session, &routing.to).await else {
        warn!(
            client_id = %client.id(),
            "Dropping {}: client {} is not in session {}",
            kind.as_str(),
            routing.to,
            session.id()
        );
        return;
    };

    if let Err(e) = recipient.send_text(raw.to_string()).await {
        warn!(
            "Failed to relay {} to {}: {}",
            kind.as_str(),
            recipient.id(),
            e
        );
    }
}

async fn find_recipient(session: &Session, to: &str) -> Option<Arc<Client>> {
    let id = Uuid::parse_str(to).ok()?;
    session.member(id).await
}

/// Decode `{session_id}`, replying `INVALID_PAYLOAD` when it is missing
async fn session_id_payload(
    client: &Client,
    envelope: &Envelope,
) -> Result<Option<SessionIdPayload>, RouteError> {
    match envelope.decode_payload::<SessionIdPayload>() {
        Ok(payload) => Ok(Some(payload)),
        Err(e) => {
            debug!(client_id = %client.id(), "Invalid {} payload: {}", envelope.kind, e);
            client
                .send(&ServerMessage::error(
                    ErrorCode::InvalidPayload,
                    format!("invalid {} payload: {}", envelope.kind, e),
                ))
                .await?;
            Ok(None)
        }
    }
}

/// Report a session error to the requesting client
async fn reply_error(client: &Client, err: &SessionError) -> Result<(), RouteError> {
    let code = match err {
        SessionError::NotFound(_) => ErrorCode::SessionNotFound,
        SessionError::Full(_) => ErrorCode::SessionFull,
        SessionError::CodeSpace { .. } | SessionError::Entropy(_) => ErrorCode::ServerError,
    };
    client
        .send(&ServerMessage::error(code, err.to_string()))
        .await?;
    Ok(())
}
