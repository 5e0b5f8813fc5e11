//! WebSocket test client for protocol testing
//!
//! Provides both low-level WsConnection and high-level TestClient.
//!
//! Note: Some methods may appear unused because they're only used in specific
//! test files and clippy checks each test independently.

use std::net::SocketAddr;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long to wait for an expected message
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Low-level WebSocket connection
pub struct WsConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl WsConnection {
    /// Connect to WebSocket endpoint with the given User-Agent
    pub async fn connect(addr: SocketAddr, user_agent: &str) -> Self {
        let mut request = format!("ws://{}/ws", addr)
            .into_client_request()
            .expect("Invalid request");
        request.headers_mut().insert(
            "User-Agent",
            HeaderValue::from_str(user_agent).expect("Invalid user agent"),
        );
        let (ws, _) = tokio_tungstenite::connect_async(request)
            .await
            .expect("Failed to connect");
        let (sink, stream) = ws.split();
        Self { sink, stream }
    }

    /// Send raw text message
    pub async fn send_raw(&mut self, msg: &str) {
        self.sink
            .send(Message::Text(msg.to_string().into()))
            .await
            .unwrap();
    }

    /// Send JSON message
    pub async fn send_json<T: Serialize>(&mut self, msg: &T) {
        let json = serde_json::to_string(msg).unwrap();
        self.send_raw(&json).await;
    }

    /// Receive raw text message; None if the connection closed
    pub async fn next_text(&mut self) -> Option<String> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(text.as_str().to_string()),
                Some(Ok(Message::Close(_))) => return None,
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => return None,
            }
        }
    }

    /// Receive raw text message
    pub async fn recv_raw(&mut self) -> String {
        tokio::time::timeout(RECV_TIMEOUT, self.next_text())
            .await
            .expect("Timed out waiting for message")
            .expect("WebSocket closed")
    }

    /// Receive with timeout, returns None if timeout or closed
    pub async fn recv_timeout(&mut self, duration: Duration) -> Option<String> {
        tokio::time::timeout(duration, self.next_text())
            .await
            .ok()
            .flatten()
    }

    /// Wait until the server closes the connection
    pub async fn expect_closed(&mut self, duration: Duration) {
        let closed = tokio::time::timeout(duration, async {
            while self.next_text().await.is_some() {}
        })
        .await;
        assert!(closed.is_ok(), "Expected the server to close the connection");
    }

    /// Close the connection from the client side
    pub async fn close(mut self) {
        let _ = self.sink.close().await;
    }
}

/// High-level test client with helper methods
pub struct TestClient {
    pub conn: WsConnection,
    /// Identity the server assigned on connect
    pub identity: Value,
}

impl TestClient {
    /// Connect to server (consumes the initial identity message)
    #[allow(dead_code)]
    pub async fn connect(addr: SocketAddr) -> Self {
        Self::connect_with_agent(
            addr,
            "Mozilla/5.0 (X11; Linux x86_64; rv:126.0) Gecko/20100101 Firefox/126.0",
        )
        .await
    }

    /// Connect with a specific User-Agent header
    #[allow(dead_code)]
    pub async fn connect_with_agent(addr: SocketAddr, user_agent: &str) -> Self {
        let mut conn = WsConnection::connect(addr, user_agent).await;

        let identity = recv_json(&mut conn).await;
        assert_eq!(
            identity["type"], "identity",
            "Expected identity message on connect"
        );

        Self {
            conn,
            identity: identity["payload"].clone(),
        }
    }

    /// The client id assigned by the server
    #[allow(dead_code)]
    pub fn id(&self) -> String {
        self.identity["id"].as_str().unwrap().to_string()
    }

    /// Request a new session, returns its share code
    #[allow(dead_code)]
    pub async fn request_session(&mut self) -> String {
        self.conn
            .send_json(&json!({"type": "request-session"}))
            .await;

        let response = self.recv().await;
        assert_eq!(
            response["type"], "session-created",
            "Expected session-created but got: {}",
            response
        );
        response["payload"]["id"].as_str().unwrap().to_string()
    }

    /// Send join-session without waiting for a reply
    #[allow(dead_code)]
    pub async fn join_session(&mut self, code: &str) {
        self.conn
            .send_json(&json!({"type": "join-session", "payload": {"session_id": code}}))
            .await;
    }

    /// Send leave-session without waiting for a reply
    #[allow(dead_code)]
    pub async fn leave_session(&mut self, code: &str) {
        self.conn
            .send_json(&json!({"type": "leave-session", "payload": {"session_id": code}}))
            .await;
    }

    /// Send a signaling message to another client
    #[allow(dead_code)]
    pub async fn signal(&mut self, kind: &str, code: &str, to: &str, extra: Value) {
        let mut payload = json!({"session_id": code, "from": self.id(), "to": to});
        if let (Some(payload), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
            payload.extend(extra.clone());
        }
        self.conn
            .send_json(&json!({"type": kind, "payload": payload}))
            .await;
    }

    /// Receive next message
    #[allow(dead_code)]
    pub async fn recv(&mut self) -> Value {
        recv_json(&mut self.conn).await
    }

    /// Receive next message and check its type
    #[allow(dead_code)]
    pub async fn expect(&mut self, kind: &str) -> Value {
        let msg = self.recv().await;
        assert_eq!(msg["type"], kind, "Expected {} but got: {}", kind, msg);
        msg
    }

    /// Assert no message received within duration
    #[allow(dead_code)]
    pub async fn expect_no_message(&mut self, duration: Duration) {
        assert!(
            self.conn.recv_timeout(duration).await.is_none(),
            "Expected no message but received one"
        );
    }
}

async fn recv_json(conn: &mut WsConnection) -> Value {
    let text = conn.recv_raw().await;
    serde_json::from_str(&text).expect("Failed to parse JSON")
}
