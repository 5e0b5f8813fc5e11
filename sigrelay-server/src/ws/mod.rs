//! WebSocket module for peer signaling

mod connection;
mod router;

pub use connection::ws_handler;
pub use router::{RouteError, route};
