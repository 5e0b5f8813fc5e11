//! Connected peer identity and serialized outbound writes

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::device::DeviceType;
use crate::error::TransportError;
use crate::namegen::generate_name;
use crate::transport::Outbound;

/// Unique identifier for a connected client
pub type ClientId = Uuid;

/// Public identity of a client, as shown to itself and to its peer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientInfo {
    pub id: ClientId,
    pub display_name: String,
    pub device_type: DeviceType,
    pub device_name: String,
}

/// One connected peer
///
/// A client lives exactly as long as its connection. Writes to the
/// connection go through a per-client lock because the owning connection
/// task and other peers' tasks (broadcasts) may write concurrently.
pub struct Client {
    info: ClientInfo,
    /// Code of the session this client is in. Only `Session` mutates it.
    session_id: Mutex<Option<String>>,
    outbound: AsyncMutex<Box<dyn Outbound>>,
}

impl Client {
    /// Create a client with a fresh id and a generated display name
    pub fn new(device_type: DeviceType, device_name: String, outbound: Box<dyn Outbound>) -> Self {
        Self::with_info(
            ClientInfo {
                id: Uuid::new_v4(),
                display_name: generate_name(),
                device_type,
                device_name,
            },
            outbound,
        )
    }

    /// Create a client with an explicit identity
    pub fn with_info(info: ClientInfo, outbound: Box<dyn Outbound>) -> Self {
        Self {
            info,
            session_id: Mutex::new(None),
            outbound: AsyncMutex::new(outbound),
        }
    }

    pub fn id(&self) -> ClientId {
        self.info.id
    }

    pub fn info(&self) -> &ClientInfo {
        &self.info
    }

    /// Code of the session this client currently belongs to
    pub fn session_id(&self) -> Option<String> {
        self.session_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_session_id(&self, code: &str) {
        *self.session_id.lock().unwrap_or_else(PoisonError::into_inner) = Some(code.to_string());
    }

    /// Clear the affiliation if it still points at `code`
    pub(crate) fn clear_session_id(&self, code: &str) {
        let mut session_id = self.session_id.lock().unwrap_or_else(PoisonError::into_inner);
        if session_id.as_deref() == Some(code) {
            *session_id = None;
        }
    }

    /// Serialize `msg` as JSON and write it as one frame
    pub async fn send<T: Serialize + ?Sized>(&self, msg: &T) -> Result<(), TransportError> {
        let json = serde_json::to_string(msg)?;
        self.send_text(json).await
    }

    /// Write a pre-encoded frame
    pub async fn send_text(&self, text: String) -> Result<(), TransportError> {
        self.outbound.lock().await.send_text(text).await
    }

    /// Close the underlying connection
    pub async fn close(&self) -> Result<(), TransportError> {
        self.outbound.lock().await.close().await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("info", &self.info)
            .field("session_id", &self.session_id())
            .finish_non_exhaustive()
    }
}
