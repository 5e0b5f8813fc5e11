//! SessionStore: the registry of live sessions keyed by share code
//!
//! The store is constructed once per server and shared by every connection
//! task. Its map lock is independent of each session's roster lock and the
//! two are never held at the same time.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use super::code::generate_code;
use super::state::Session;
use crate::error::SessionError;

/// How many codes to draw before giving up on finding a free one
pub const MAX_CODE_ATTEMPTS: usize = 16;

/// Concurrent mapping from share code to [`Session`]
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session under a fresh share code
    ///
    /// Codes already in use are redrawn, so an active session is never
    /// overwritten.
    pub async fn create(&self) -> Result<Arc<Session>, SessionError> {
        let mut sessions = self.sessions.write().await;

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code().map_err(|e| SessionError::Entropy(e.to_string()))?;
            if sessions.contains_key(&code) {
                warn!("Share code collision on {}, drawing again", code);
                continue;
            }
            let session = Arc::new(Session::new(code.clone()));
            sessions.insert(code, Arc::clone(&session));
            return Ok(session);
        }

        Err(SessionError::CodeSpace {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    /// Look up a session by share code
    pub async fn get(&self, code: &str) -> Result<Arc<Session>, SessionError> {
        self.sessions
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(code.to_string()))
    }

    /// Remove a session; no-op if it is already gone
    pub async fn delete(&self, code: &str) {
        self.sessions.write().await.remove(code);
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
