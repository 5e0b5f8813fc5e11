//! Shared test utilities for sigrelay-server integration tests

pub mod client;

use std::net::SocketAddr;
use std::sync::Arc;

use sigrelay_server::{AppState, RelayServer, ServerConfig};
use tokio::net::TcpListener;

/// Creates a test server with default config, returns state and address
#[allow(dead_code)]
pub async fn create_test_server() -> (Arc<AppState>, SocketAddr) {
    create_test_server_with_state(AppState::new()).await
}

/// Creates a test server around the given state
#[allow(dead_code)]
pub async fn create_test_server_with_state(state: AppState) -> (Arc<AppState>, SocketAddr) {
    let state = Arc::new(state);
    let server = RelayServer::with_state(ServerConfig::default(), Arc::clone(&state));
    let addr = spawn_server(server).await;

    (state, addr)
}

/// Waits until `code` is no longer in the store, failing after two seconds
///
/// Peers hear `session-left` before the server deletes the code, so a lookup
/// right after that message can still see the session.
#[allow(dead_code)]
pub async fn wait_for_session_removed(state: &AppState, code: &str) {
    let removed = tokio::time::timeout(std::time::Duration::from_secs(2), async {
        while state.sessions.get(code).await.is_ok() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(removed.is_ok(), "Session {} was never removed", code);
}

/// Spawns server in background task, returns bound address
async fn spawn_server(server: RelayServer) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    // Brief delay to ensure server is accepting connections
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    addr
}
