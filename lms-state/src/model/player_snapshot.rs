//! Fully-known player state

use lms_protocol::PlayerId;
use serde::{Deserialize, Serialize};

/// Every attribute of a player, available once all have been observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Player address
    pub id: PlayerId,
    /// Server-side index from the identity reply, if known
    pub index: Option<usize>,
    /// Display name
    pub name: String,
    /// Mixer volume as last reported
    pub volume: i32,
    /// Whether the player is connected to the server
    pub connected: bool,
}
