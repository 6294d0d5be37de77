//! Outbound command channel
//!
//! Players and the registry never touch the socket. They push commands into
//! an unbounded channel drained by the connection's writer, which keeps all
//! state mutation on the line-processing path.

use lms_protocol::Command;
use tokio::sync::mpsc;

use crate::{Result, StateError};

/// Cloneable handle for issuing commands to the server
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Command>,
}

impl Outbox {
    /// Create an outbox and the receiver the writer drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a command for sending
    pub fn send(&self, command: Command) -> Result<()> {
        tracing::debug!("> {}", command);
        self.tx.send(command).map_err(|_| StateError::ConnectionClosed)
    }

    /// Check whether the writer side is gone
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
