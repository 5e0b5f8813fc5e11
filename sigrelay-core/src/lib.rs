//! sigrelay-core: Core library for the sigrelay signaling relay
//!
//! This crate provides the shared state behind the relay:
//!
//! - **Clients** - [`Client`] holds a peer's identity and serializes writes to its connection
//! - **Sessions** - [`Session`] pairs up to two clients; [`SessionStore`] maps share codes to sessions
//! - **Protocol** - [`Envelope`] and [`ServerMessage`] for the `{type, payload}` wire format
//! - **Transport** - the [`Outbound`] trait and the in-memory [`ChannelOutbound`]
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │               SessionStore               │
//! │  code ──► Session                        │
//! │           ┌───────────────────────────┐  │
//! │           │ roster: [host, guest]     │  │
//! │           │   Client ──► Outbound     │  │
//! │           └───────────────────────────┘  │
//! └──────────────────────────────────────────┘
//! ```

pub mod client;
pub mod device;
pub mod error;
pub mod namegen;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-export key types for convenience
pub use client::{Client, ClientId, ClientInfo};
pub use device::{DeviceType, classify};
pub use error::{SessionError, TransportError};
pub use namegen::generate_name;
pub use protocol::{
    Envelope, ErrorCode, ErrorPayload, MessageType, RtcRouting, ServerMessage, SessionIdPayload,
};
pub use session::{Departure, JoinOutcome, Session, SessionSnapshot, SessionStore};
pub use transport::{ChannelOutbound, Outbound};
