//! Change notifications published by the registry

use lms_protocol::{PlayerId, SyncGroup};
use serde::{Deserialize, Serialize};

use super::PlayerSnapshot;

/// Something observable about the server changed
///
/// Emitted in the order the registry applied the underlying lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateChange {
    /// A `player count` reply discarded every known player
    PlayersReset { expected: usize },

    /// A player was registered and its attribute queries were sent
    PlayerAdded { player_id: PlayerId },

    /// A player disconnected or was forgotten
    PlayerRemoved { player_id: PlayerId },

    /// A fully known player changed
    PlayerUpdated { snapshot: PlayerSnapshot },

    /// The sync group partition was replaced
    GroupsChanged { groups: Vec<SyncGroup> },

    /// First bootstrap finished
    ///
    /// Emitted once per registry. A later reset re-runs bootstrap without
    /// announcing readiness again; poll [`Registry::is_ready`](crate::Registry::is_ready)
    /// to follow the phase.
    Ready {
        player_count: usize,
        group_count: usize,
    },

    /// A line nothing claimed
    UnhandledLine {
        player_id: Option<PlayerId>,
        line: String,
    },

    /// A line matched a rule but its payload was rejected
    ParseFailure { line: String, error: String },

    /// The connection ended
    ConnectionClosed { reason: String },
}

impl StateChange {
    /// The player this change concerns, if any
    pub fn player_id(&self) -> Option<&PlayerId> {
        match self {
            StateChange::PlayerAdded { player_id } | StateChange::PlayerRemoved { player_id } => {
                Some(player_id)
            }
            StateChange::PlayerUpdated { snapshot } => Some(&snapshot.id),
            StateChange::UnhandledLine { player_id, .. } => player_id.as_ref(),
            StateChange::PlayersReset { .. }
            | StateChange::GroupsChanged { .. }
            | StateChange::Ready { .. }
            | StateChange::ParseFailure { .. }
            | StateChange::ConnectionClosed { .. } => None,
        }
    }

    /// Diagnostics rather than state updates
    pub fn is_diagnostic(&self) -> bool {
        matches!(
            self,
            StateChange::UnhandledLine { .. } | StateChange::ParseFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_accessor() {
        let id = PlayerId::new("aa:aa:aa:aa:aa:aa");
        let snapshot = PlayerSnapshot {
            id: id.clone(),
            index: Some(0),
            name: "Kitchen".into(),
            volume: 30,
            connected: true,
        };

        assert_eq!(StateChange::PlayerUpdated { snapshot }.player_id(), Some(&id));
        assert_eq!(
            StateChange::PlayerRemoved { player_id: id.clone() }.player_id(),
            Some(&id)
        );
        assert_eq!(StateChange::PlayersReset { expected: 2 }.player_id(), None);
        assert_eq!(
            StateChange::UnhandledLine {
                player_id: None,
                line: "foo".into()
            }
            .player_id(),
            None
        );
    }

    #[test]
    fn test_diagnostics() {
        assert!(StateChange::ParseFailure {
            line: "syncgroups x".into(),
            error: "bad".into()
        }
        .is_diagnostic());
        assert!(!StateChange::GroupsChanged { groups: vec![] }.is_diagnostic());
    }
}
