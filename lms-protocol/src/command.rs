//! Outbound command vocabulary
//!
//! Every command renders to the exact literal the server expects. Commands
//! are fire-and-forget: there is no request tag, replies are correlated by
//! their shape alone.

use std::fmt;

use crate::player_id::PlayerId;

/// Argument sent with `sync` to leave a group
pub const UNSYNC_SENTINEL: &str = "-";

/// A command addressed to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `player count ?`
    PlayerCount,
    /// `player id <index> ?`
    PlayerId { index: usize },
    /// `syncgroups ?`
    SyncGroups,
    /// `listen 1` / `listen 0`
    Listen(bool),
    /// `<player> <command>`
    Player {
        player: PlayerId,
        command: PlayerCommand,
    },
}

/// A command scoped to a single player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    /// `name ?`
    Name,
    /// `mixer volume ?`
    Volume,
    /// `connected ?`
    Connected,
    /// `power 1` / `power 0`
    Power(bool),
    /// `mixer volume <n>`
    SetVolume(u8),
    /// `mixer volume +<n>` / `mixer volume -<n>`
    AdjustVolume(i32),
    /// `sync <other>`
    SyncTo(PlayerId),
    /// `sync -`
    Unsync,
}

impl Command {
    /// Shorthand for a player-scoped command
    pub fn player(player: &PlayerId, command: PlayerCommand) -> Self {
        Command::Player {
            player: player.clone(),
            command,
        }
    }

    /// Render the command with its trailing newline
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::PlayerCount => f.write_str("player count ?"),
            Command::PlayerId { index } => write!(f, "player id {} ?", index),
            Command::SyncGroups => f.write_str("syncgroups ?"),
            Command::Listen(on) => write!(f, "listen {}", u8::from(*on)),
            Command::Player { player, command } => write!(f, "{} {}", player, command),
        }
    }
}

impl fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerCommand::Name => f.write_str("name ?"),
            PlayerCommand::Volume => f.write_str("mixer volume ?"),
            PlayerCommand::Connected => f.write_str("connected ?"),
            PlayerCommand::Power(on) => write!(f, "power {}", u8::from(*on)),
            PlayerCommand::SetVolume(volume) => write!(f, "mixer volume {}", volume),
            PlayerCommand::AdjustVolume(delta) => write!(f, "mixer volume {:+}", delta),
            PlayerCommand::SyncTo(other) => write!(f, "sync {}", other),
            PlayerCommand::Unsync => write!(f, "sync {}", UNSYNC_SENTINEL),
        }
    }
}
