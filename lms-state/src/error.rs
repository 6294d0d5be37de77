//! Error types for lms-state

use lms_protocol::{PlayerId, ProtocolError};
use thiserror::Error;

/// Result type for lms-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors that can occur during state management
#[derive(Debug, Error)]
pub enum StateError {
    /// The outbound command channel is gone; the connection has ended
    #[error("Connection closed")]
    ConnectionClosed,

    /// No player with this address is registered
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// Error from the protocol layer
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
