//! Bootstrap phases of the registry

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the registry is in its bootstrap sequence
///
/// ```text
/// AwaitingCount → AwaitingIdentities → AwaitingGroups → Live
///                        ↑                                │
///                        └──── player count notification ─┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BootstrapPhase {
    /// `player count ?` sent, waiting for the reply
    #[default]
    AwaitingCount,
    /// One `player id I ?` sent per index, waiting for every identity
    AwaitingIdentities,
    /// `syncgroups ?` sent, waiting for the first listing
    AwaitingGroups,
    /// Bootstrap complete; unsolicited notifications drive updates
    Live,
}

impl BootstrapPhase {
    /// Whether bootstrap has completed
    pub fn is_live(self) -> bool {
        self == BootstrapPhase::Live
    }
}

impl fmt::Display for BootstrapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootstrapPhase::AwaitingCount => "awaiting-count",
            BootstrapPhase::AwaitingIdentities => "awaiting-identities",
            BootstrapPhase::AwaitingGroups => "awaiting-groups",
            BootstrapPhase::Live => "live",
        };
        f.write_str(name)
    }
}
