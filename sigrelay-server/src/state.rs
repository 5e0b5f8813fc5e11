//! Shared application state for the sigrelay server

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sigrelay_core::SessionStore;

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Registry of live sessions, shared by every connection
    pub sessions: Arc<SessionStore>,
    /// Close connections that send nothing for this long
    pub idle_timeout: Option<Duration>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create a new AppState with an empty session store
    pub fn new() -> Self {
        Self::with_sessions(Arc::new(SessionStore::new()))
    }

    /// Create AppState around an existing store (for testing)
    pub fn with_sessions(sessions: Arc<SessionStore>) -> Self {
        Self {
            sessions,
            idle_timeout: None,
            started_at: Utc::now(),
        }
    }

    /// Set the idle timeout for new connections
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
