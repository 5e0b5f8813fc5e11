//! Outbound half of a client connection
//!
//! The relay only ever writes whole JSON text frames to a peer. The server implements
//! [`Outbound`] for the write half of an axum WebSocket; tests use
//! [`ChannelOutbound`] to capture frames in memory.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Write side of a peer connection
#[async_trait]
pub trait Outbound: Send {
    /// Write one text frame
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the connection; further writes fail with [`TransportError::Closed`]
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// In-memory [`Outbound`] backed by an unbounded channel
///
/// Every frame written is delivered to the paired receiver. Closing drops the
/// sender, so the receiver observes the end of the stream.
pub struct ChannelOutbound {
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl ChannelOutbound {
    /// Create an outbound and the receiver that observes its frames
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }
}

#[async_trait]
impl Outbound for ChannelOutbound {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(text).map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx.take();
        Ok(())
    }
}
