//! Typed events decoded from inbound lines

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::player_id::PlayerId;
use crate::syncgroups::SyncGroup;

/// The single event produced for each inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent {
    /// `player count N`
    PlayerCount(usize),

    /// `player id I MAC`
    PlayerId { index: usize, player: PlayerId },

    /// `syncgroups ...` or a bare `syncgroups`
    SyncGroups(Vec<SyncGroup>),

    /// Echo of `listen ...`
    ListenAck(String),

    /// `<id> client new|reconnect|disconnect|forget`
    Client { player: PlayerId, change: ClientChange },

    /// A recognised per-player notification or reply
    Player { player: PlayerId, event: PlayerEvent },

    /// A keyword matched but its payload could not be decoded
    Malformed { line: String, error: ProtocolError },

    /// Nothing matched; `player` is set when the line addressed a known player
    Unmatched {
        player: Option<PlayerId>,
        line: String,
    },
}

impl ProtocolEvent {
    /// The player this event is scoped to, if any
    pub fn player(&self) -> Option<&PlayerId> {
        match self {
            ProtocolEvent::PlayerId { player, .. } => Some(player),
            ProtocolEvent::Client { player, .. } => Some(player),
            ProtocolEvent::Player { player, .. } => Some(player),
            ProtocolEvent::Unmatched { player, .. } => player.as_ref(),
            ProtocolEvent::PlayerCount(_)
            | ProtocolEvent::SyncGroups(_)
            | ProtocolEvent::ListenAck(_)
            | ProtocolEvent::Malformed { .. } => None,
        }
    }
}

/// Player-scoped events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// `mixer volume V`
    Volume(VolumeChange),
    /// `name S`
    Name(String),
    /// `connected B`
    Connected(bool),
    /// Any `sync ...` line; group membership must be re-queried
    SyncChanged(String),
}

/// A volume report, either absolute or a delta on the last known value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeChange {
    Absolute(i32),
    Relative(i32),
}

impl VolumeChange {
    /// Apply this change to the previously known volume
    ///
    /// A relative change has nothing to apply to when no volume is known.
    pub fn apply_to(self, current: Option<i32>) -> Option<i32> {
        match self {
            VolumeChange::Absolute(volume) => Some(volume),
            VolumeChange::Relative(delta) => current.map(|v| v.saturating_add(delta)),
        }
    }
}

impl FromStr for VolumeChange {
    type Err = ProtocolError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        let invalid = || ProtocolError::InvalidNumber {
            field: "volume",
            value: token.to_string(),
        };

        if let Some(delta) = token.strip_prefix('+') {
            delta.parse().map(VolumeChange::Relative).map_err(|_| invalid())
        } else if token.starts_with('-') {
            token.parse().map(VolumeChange::Relative).map_err(|_| invalid())
        } else {
            token.parse().map(VolumeChange::Absolute).map_err(|_| invalid())
        }
    }
}

/// Client lifecycle notifications sent while listening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientChange {
    New,
    Reconnect,
    Disconnect,
    Forget,
}

impl ClientChange {
    /// Whether the player is (re)joining the server
    pub fn is_arrival(self) -> bool {
        matches!(self, ClientChange::New | ClientChange::Reconnect)
    }
}

impl FromStr for ClientChange {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ClientChange::New),
            "reconnect" => Ok(ClientChange::Reconnect),
            "disconnect" => Ok(ClientChange::Disconnect),
            "forget" => Ok(ClientChange::Forget),
            _ => Err(()),
        }
    }
}
