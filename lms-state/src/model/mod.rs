//! Model types for lms-state

mod phase;
mod player_snapshot;
mod state_change;

pub use phase::BootstrapPhase;
pub use player_snapshot::PlayerSnapshot;
pub use state_change::StateChange;
