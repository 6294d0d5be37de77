//! LmsSystem - main entry point for the SDK
//!
//! Sync-first: connect, wait for bootstrap, then read players and groups
//! or block on the change stream. No async/await required.

use std::sync::Arc;
use std::time::Duration;

use lms_protocol::{Command, PlayerId, SyncGroup};
use lms_state::{BootstrapPhase, ChangeIterator, Outbox, Player, PlayerSnapshot, Registry};
use parking_lot::Mutex;

use crate::config::ConnectionConfig;
use crate::connection::{self, ConnectionHandle, Shared};
use crate::{Result, SdkError};

/// A live connection to one server
///
/// # Example
///
/// ```rust,ignore
/// use std::time::Duration;
/// use lms_sdk::{ConnectionConfig, LmsSystem, StateChange};
///
/// fn main() -> Result<(), lms_sdk::SdkError> {
///     let system = LmsSystem::connect(ConnectionConfig::new("192.168.1.10"))?;
///     system.wait_ready(Duration::from_secs(10))?;
///
///     for group in system.groups() {
///         println!("{:?}", group.members());
///     }
///
///     for change in system.iter() {
///         if let StateChange::PlayerUpdated { snapshot } = change {
///             println!("{} volume {}", snapshot.name, snapshot.volume);
///         }
///     }
///     Ok(())
/// }
/// ```
pub struct LmsSystem {
    shared: Arc<Shared>,
    outbox: Outbox,
    changes: ChangeIterator,
    connection: Mutex<ConnectionHandle>,
}

impl LmsSystem {
    /// Connect and start bootstrap
    ///
    /// Returns once the socket is open. Bootstrap continues in the
    /// background; use [`wait_ready`](Self::wait_ready) to block until the
    /// first complete picture of players and groups is available.
    ///
    /// Blocks the calling thread, so it must not be called from inside an
    /// async runtime.
    pub fn connect(config: ConnectionConfig) -> Result<Self> {
        config.validate()?;

        let (outbox, commands) = Outbox::channel();
        let (changes_tx, changes) = ChangeIterator::channel();
        let registry = Registry::new(outbox.clone(), changes_tx.clone());
        let shared = Arc::new(Shared::new(registry));

        let connection = connection::spawn(config, Arc::clone(&shared), commands, changes_tx)?;

        Ok(Self {
            shared,
            outbox,
            changes,
            connection: Mutex::new(connection),
        })
    }

    /// Connect using `LMS_HOST` and `LMS_PORT`
    pub fn from_env() -> Result<Self> {
        Self::connect(ConnectionConfig::from_env()?)
    }

    /// Get a player by address
    ///
    /// The returned handle holds the attributes known at the time of the
    /// call and can issue commands.
    pub fn get_player(&self, id: &PlayerId) -> Option<Player> {
        self.shared.registry.read().player(id).cloned()
    }

    /// Like [`get_player`](Self::get_player), but an unknown address is an error
    pub fn player(&self, id: &PlayerId) -> Result<Player> {
        self.get_player(id)
            .ok_or_else(|| SdkError::PlayerNotFound(id.clone()))
    }

    /// Get a player by display name
    pub fn get_player_by_name(&self, name: &str) -> Option<Player> {
        self.shared
            .registry
            .read()
            .players()
            .find(|p| p.name() == Some(name))
            .cloned()
    }

    /// All players in registration order
    pub fn players(&self) -> Vec<Player> {
        self.shared.registry.read().players().cloned().collect()
    }

    /// Snapshots of every fully known player
    pub fn snapshots(&self) -> Vec<PlayerSnapshot> {
        self.shared.registry.read().snapshots()
    }

    // ========================================================================
    // Group Methods
    // ========================================================================

    /// Current partition of players into sync groups
    ///
    /// Every known player is in exactly one group; an ungrouped player
    /// forms a group of one.
    pub fn groups(&self) -> Vec<SyncGroup> {
        self.shared.registry.read().groups().to_vec()
    }

    /// The group containing a player
    pub fn group_of(&self, id: &PlayerId) -> Option<SyncGroup> {
        self.shared.registry.read().group_of(id).cloned()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub fn phase(&self) -> BootstrapPhase {
        self.shared.registry.read().phase()
    }

    pub fn is_ready(&self) -> bool {
        self.shared.registry.read().is_ready()
    }

    /// Whether the connection is still up
    pub fn is_connected(&self) -> bool {
        !self.shared.is_closed()
    }

    /// Block until bootstrap completes
    ///
    /// Fails with [`SdkError::Timeout`] if it does not complete in time and
    /// [`SdkError::ConnectionClosed`] if the connection ends first.
    pub fn wait_ready(&self, timeout: Duration) -> Result<()> {
        self.shared.wait_ready(timeout)
    }

    /// Blocking iterator over state changes
    ///
    /// Clones share one queue, so each change is seen by one consumer.
    pub fn iter(&self) -> ChangeIterator {
        self.changes.clone()
    }

    /// Queue a raw command
    pub fn send(&self, command: Command) -> Result<()> {
        Ok(self.outbox.send(command)?)
    }

    /// Close the connection and stop the worker
    ///
    /// Idempotent. Also runs on drop.
    pub fn shutdown(&self) {
        self.connection.lock().shutdown();
    }
}

impl Drop for LmsSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}
