use std::time::Duration;

use lms_protocol::PlayerId;
use thiserror::Error;

/// Result type for lms-sdk operations
pub type Result<T> = std::result::Result<T, SdkError>;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("State management error: {0}")]
    State(#[from] lms_state::StateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Not ready after {0:?}")]
    Timeout(Duration),

    #[error("Connection worker failed: {0}")]
    Worker(String),
}
