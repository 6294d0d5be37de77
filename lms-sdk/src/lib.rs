//! Sync-first client for the Logitech Media Server CLI
//!
//! Connects to the server's line-oriented control port, bootstraps the
//! list of players and their sync groups, then keeps that picture live
//! from the server's notifications.
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use lms_sdk::{ConnectionConfig, LmsSystem};
//!
//! let system = LmsSystem::connect(ConnectionConfig::new("lms.local"))?;
//! system.wait_ready(Duration::from_secs(10))?;
//!
//! for player in system.players() {
//!     println!("{} {:?}", player.id(), player.name());
//! }
//! ```
//!
//! Logging goes through `tracing`; see [`logging`] to render it.

mod connection;
mod error;
mod system;

pub mod config;

pub use config::ConnectionConfig;
pub use error::{Result, SdkError};
pub use system::LmsSystem;

pub use lms_protocol::{Command, PlayerCommand, PlayerId, SyncGroup};
pub use lms_state::{
    logging, BootstrapPhase, ChangeIterator, Player, PlayerSnapshot, StateChange,
};
