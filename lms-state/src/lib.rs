//! Live mirror of a Logitech Media Server's players and sync groups
//!
//! [`Registry`] consumes inbound lines, drives the bootstrap sequence
//! (player count, then identities, then groups) and keeps a
//! [`Player`] per address along with the partition of players into
//! [`SyncGroup`](lms_protocol::SyncGroup)s. Every observable change is
//! published as a [`StateChange`] on a channel read through
//! [`ChangeIterator`].
//!
//! Nothing here touches a socket. Commands go out through an [`Outbox`],
//! so the registry can be driven by a real connection or by a test that
//! feeds it lines directly:
//!
//! ```rust
//! use lms_state::{ChangeIterator, Outbox, Registry, StateChange};
//!
//! let (outbox, mut commands) = Outbox::channel();
//! let (tx, changes) = ChangeIterator::channel();
//! let mut registry = Registry::new(outbox, tx);
//!
//! registry.start().unwrap();
//! registry.handle_line(b"player count 0").unwrap();
//! registry.handle_line(b"syncgroups").unwrap();
//!
//! assert!(registry.is_ready());
//! assert!(changes
//!     .try_iter()
//!     .any(|c| matches!(c, StateChange::Ready { player_count: 0, .. })));
//!
//! let sent: Vec<String> = std::iter::from_fn(|| commands.try_recv().ok())
//!     .map(|c| c.to_string())
//!     .collect();
//! assert_eq!(sent, ["player count ?", "syncgroups ?", "listen 1"]);
//! ```

pub mod error;
pub mod iter;
pub mod logging;
pub mod model;
pub mod outbox;
pub mod player;
pub mod registry;

pub use error::{Result, StateError};
pub use iter::{ChangeIterator, TimeoutIter, TryIter};
pub use model::{BootstrapPhase, PlayerSnapshot, StateChange};
pub use outbox::Outbox;
pub use player::Player;
pub use registry::{reconcile_groups, Registry};

// Re-export protocol types callers need alongside the registry
pub use lms_protocol::{Command, PlayerCommand, PlayerId, SyncGroup};

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::iter::ChangeIterator;
    pub use crate::model::{BootstrapPhase, PlayerSnapshot, StateChange};
    pub use crate::outbox::Outbox;
    pub use crate::player::Player;
    pub use crate::registry::Registry;
    pub use lms_protocol::{PlayerId, SyncGroup};
}
