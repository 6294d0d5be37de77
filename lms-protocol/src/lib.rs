//! Logitech Media Server CLI protocol
//!
//! The server's command-line interface is a line-oriented text protocol over
//! a single TCP stream (port 9090 by default). This crate covers the
//! transport-independent half of talking to it:
//!
//! - **Framing**: [`LineFramer`] turns arbitrary read chunks into lines
//! - **Decoding**: inbound lines are percent-decoded before matching
//! - **Dispatch**: [`Dispatcher`] classifies each line into one [`ProtocolEvent`]
//! - **Commands**: [`Command`] renders the exact outbound literals
//!
//! # Architecture
//!
//! ```text
//! bytes → LineFramer → lines → Dispatcher → ProtocolEvent
//!                                  ↑
//!                          known player addresses
//! ```
//!
//! # Example
//!
//! ```rust
//! use lms_protocol::{Dispatcher, LineFramer, PlayerId, ProtocolEvent};
//!
//! let mut framer = LineFramer::new();
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register(&PlayerId::new("aa:aa:aa:aa:aa:aa"));
//!
//! framer.push(b"player count 1\naa%3Aaa%3Aaa%3Aaa%3Aaa%3Aaa name Kit");
//! framer.push(b"chen\n");
//!
//! let events: Vec<ProtocolEvent> = framer
//!     .drain()
//!     .map(|line| dispatcher.dispatch(&line.unwrap()))
//!     .collect();
//! assert_eq!(events.len(), 2);
//! ```

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod framer;
pub mod player_id;
pub mod syncgroups;

pub use command::{Command, PlayerCommand, UNSYNC_SENTINEL};
pub use dispatcher::{decode_line, Dispatcher, GlobalRule, KeywordMatch, GLOBAL_RULES};
pub use error::{ProtocolError, Result};
pub use event::{ClientChange, PlayerEvent, ProtocolEvent, VolumeChange};
pub use framer::{LineFramer, Lines, DEFAULT_MAX_LINE_LENGTH};
pub use player_id::PlayerId;
pub use syncgroups::{parse_sync_groups, SyncGroup, FIELDS_PER_GROUP, MEMBERS_KEY};

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::command::{Command, PlayerCommand};
    pub use crate::dispatcher::Dispatcher;
    pub use crate::event::{ClientChange, PlayerEvent, ProtocolEvent, VolumeChange};
    pub use crate::framer::LineFramer;
    pub use crate::player_id::PlayerId;
    pub use crate::syncgroups::SyncGroup;
}
