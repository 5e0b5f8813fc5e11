//! Session management

pub mod code;
pub mod state;
pub mod store;

// Re-export key types for convenience
pub use code::{SHARE_CODE_ALPHABET, SHARE_CODE_LENGTH, generate_code, is_valid_code};
pub use state::{Departure, JoinOutcome, MAX_CLIENTS, Session, SessionSnapshot};
pub use store::SessionStore;
