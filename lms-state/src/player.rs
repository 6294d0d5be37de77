//! Per-player state and commands
//!
//! A [`Player`] holds typed optional attributes that fill in as replies
//! arrive. Once name, volume and connectivity have all been seen the
//! player is fully known, and from then on every applied update yields a
//! fresh [`PlayerSnapshot`].

use lms_protocol::{Command, PlayerCommand, PlayerEvent, PlayerId, VolumeChange};

use crate::model::PlayerSnapshot;
use crate::outbox::Outbox;
use crate::Result;

/// One playback endpoint known to the server
#[derive(Debug, Clone)]
pub struct Player {
    id: PlayerId,
    index: Option<usize>,
    name: Option<String>,
    volume: Option<i32>,
    connected: Option<bool>,
    outbox: Outbox,
}

impl Player {
    /// Register a player and query its name, volume and connectivity
    pub fn new(id: PlayerId, index: Option<usize>, outbox: Outbox) -> Result<Self> {
        let player = Self {
            id,
            index,
            name: None,
            volume: None,
            connected: None,
            outbox,
        };
        player.refresh()?;
        Ok(player)
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// Server-side index, when learned from an identity reply
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn volume(&self) -> Option<i32> {
        self.volume
    }

    pub fn connected(&self) -> Option<bool> {
        self.connected
    }

    /// All three attributes have been observed
    pub fn is_fully_known(&self) -> bool {
        self.name.is_some() && self.volume.is_some() && self.connected.is_some()
    }

    /// Current state, if fully known
    pub fn snapshot(&self) -> Option<PlayerSnapshot> {
        Some(PlayerSnapshot {
            id: self.id.clone(),
            index: self.index,
            name: self.name.clone()?,
            volume: self.volume?,
            connected: self.connected?,
        })
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Apply a player-scoped event
    ///
    /// Returns a snapshot when the update left the player fully known.
    /// Group membership changes carry no player attribute and return `None`.
    pub fn apply(&mut self, event: PlayerEvent) -> Result<Option<PlayerSnapshot>> {
        match event {
            PlayerEvent::Volume(change) => self.update_volume(change),
            PlayerEvent::Name(name) => Ok(self.set_name(name)),
            PlayerEvent::Connected(connected) => Ok(self.set_connected(connected)),
            PlayerEvent::SyncChanged(_) => Ok(None),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Option<PlayerSnapshot> {
        self.name = Some(name.into());
        self.snapshot()
    }

    pub fn set_connected(&mut self, connected: bool) -> Option<PlayerSnapshot> {
        self.connected = Some(connected);
        self.snapshot()
    }

    /// Apply an absolute or relative volume report
    ///
    /// A delta with no known volume is dropped and the absolute value is
    /// queried instead.
    pub fn update_volume(&mut self, change: VolumeChange) -> Result<Option<PlayerSnapshot>> {
        match change.apply_to(self.volume) {
            Some(volume) => {
                self.volume = Some(volume);
                Ok(self.snapshot())
            }
            None => {
                tracing::debug!(
                    "{}: volume delta {:?} with no known volume, re-querying",
                    self.id,
                    change
                );
                self.send(PlayerCommand::Volume)?;
                Ok(None)
            }
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub fn power_on(&self) -> Result<()> {
        self.send(PlayerCommand::Power(true))
    }

    pub fn power_off(&self) -> Result<()> {
        self.send(PlayerCommand::Power(false))
    }

    /// Set an absolute volume; the server clamps to 0..=100
    pub fn set_volume(&self, volume: u8) -> Result<()> {
        self.send(PlayerCommand::SetVolume(volume))
    }

    pub fn adjust_volume(&self, delta: i32) -> Result<()> {
        self.send(PlayerCommand::AdjustVolume(delta))
    }

    /// Join `other`'s sync group
    pub fn sync_to(&self, other: &PlayerId) -> Result<()> {
        self.send(PlayerCommand::SyncTo(other.clone()))
    }

    /// Leave the current sync group
    pub fn unsync(&self) -> Result<()> {
        self.send(PlayerCommand::Unsync)
    }

    /// Re-issue the name, volume and connectivity queries
    pub fn refresh(&self) -> Result<()> {
        self.send(PlayerCommand::Name)?;
        self.send(PlayerCommand::Volume)?;
        self.send(PlayerCommand::Connected)
    }

    fn send(&self, command: PlayerCommand) -> Result<()> {
        self.outbox.send(Command::player(&self.id, command))
    }
}
