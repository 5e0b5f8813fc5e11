//! WebSocket protocol message types
//!
//! Every frame is an envelope `{"type": ..., "payload": ...}`. Inbound frames
//! are decoded in two steps: first the [`Envelope`] shell with a raw payload,
//! then the payload shape dictated by the type.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recognized envelope types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    Identity,
    SessionInfo,
    JoinSession,
    LeaveSession,
    RequestSession,
    SessionCreated,
    SessionJoined,
    SessionLeft,
    ClientJoined,
    ClientLeft,
    Offer,
    Answer,
    IceCandidate,
    Error,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Identity => "identity",
            MessageType::SessionInfo => "session-info",
            MessageType::JoinSession => "join-session",
            MessageType::LeaveSession => "leave-session",
            MessageType::RequestSession => "request-session",
            MessageType::SessionCreated => "session-created",
            MessageType::SessionJoined => "session-joined",
            MessageType::SessionLeft => "session-left",
            MessageType::ClientJoined => "client-joined",
            MessageType::ClientLeft => "client-left",
            MessageType::Offer => "offer",
            MessageType::Answer => "answer",
            MessageType::IceCandidate => "ice-candidate",
            MessageType::Error => "error",
        }
    }

    /// Parse a wire type name; `None` for anything unrecognized
    pub fn from_wire(kind: &str) -> Option<Self> {
        serde_json::from_value(Value::String(kind.to_string())).ok()
    }

    /// Whether this type carries peer-to-peer signaling that is relayed as-is
    pub fn is_signaling(&self) -> bool {
        matches!(
            self,
            MessageType::Offer | MessageType::Answer | MessageType::IceCandidate
        )
    }
}

/// Inbound envelope with the payload left undecoded
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    /// Decode an envelope from a text frame
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The recognized type of this envelope, if any
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_wire(&self.kind)
    }

    /// Decode the payload into the shape required by the envelope's type
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}

/// Outbound envelope
#[derive(Debug, Clone, Serialize)]
pub struct ServerMessage<T> {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub payload: T,
}

impl<T: Serialize> ServerMessage<T> {
    pub fn new(kind: MessageType, payload: T) -> Self {
        Self { kind, payload }
    }
}

impl ServerMessage<ErrorPayload> {
    /// Build an `error` envelope
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(
            MessageType::Error,
            ErrorPayload {
                code,
                message: message.into(),
            },
        )
    }
}

/// Payload of `join-session` and `leave-session`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionIdPayload {
    pub session_id: String,
}

/// Stable error codes reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ServerError,
    SessionNotFound,
    SessionFull,
    InvalidPayload,
}

/// Payload of `error`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
}

/// Routing fields carried by `offer`, `answer` and `ice-candidate` payloads
///
/// Any other payload fields are opaque signaling data and are ignored here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RtcRouting {
    pub session_id: String,
    pub from: String,
    pub to: String,
}
