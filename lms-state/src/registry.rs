//! Player registry and bootstrap state machine
//!
//! The registry owns every [`Player`] and the derived sync group
//! partition. It is driven entirely by inbound lines: each reply or
//! notification may mutate state, queue commands, and publish
//! [`StateChange`]s, all synchronously and in stream order.
//!
//! ```text
//! start ─► AwaitingCount ──player count N──► AwaitingIdentities
//!                                                │ N players registered
//!                                                ▼
//!            Live ◄──first syncgroups reply── AwaitingGroups
//!             │
//!             └─ player count N (notification) ─► AwaitingIdentities
//! ```

use std::collections::HashSet;
use std::sync::mpsc;

use indexmap::IndexMap;
use lms_protocol::{
    ClientChange, Command, Dispatcher, PlayerEvent, PlayerId, ProtocolEvent, SyncGroup,
};
use tracing::{debug, info, warn};

use crate::model::{BootstrapPhase, PlayerSnapshot, StateChange};
use crate::outbox::Outbox;
use crate::player::Player;
use crate::Result;

/// Rebuild the group partition from a server listing
///
/// Reported groups are kept as-is and in order. Every known player absent
/// from all of them is appended as a singleton, in `known` order.
pub fn reconcile_groups<'a>(
    reported: &[SyncGroup],
    known: impl IntoIterator<Item = &'a PlayerId>,
) -> Vec<SyncGroup> {
    let grouped: HashSet<&PlayerId> = reported.iter().flat_map(|g| g.members()).collect();

    let mut groups = reported.to_vec();
    groups.extend(
        known
            .into_iter()
            .filter(|id| !grouped.contains(id))
            .cloned()
            .map(SyncGroup::standalone),
    );
    groups
}

/// Mirror of the server's players and their grouping
#[derive(Debug)]
pub struct Registry {
    phase: BootstrapPhase,
    players: IndexMap<PlayerId, Player>,
    expected_count: usize,
    groups: Vec<SyncGroup>,
    /// Last listing received, before singletons were added
    reported_groups: Vec<SyncGroup>,
    dispatcher: Dispatcher,
    outbox: Outbox,
    changes: Option<mpsc::Sender<StateChange>>,
    listening: bool,
}

impl Registry {
    pub fn new(outbox: Outbox, changes: mpsc::Sender<StateChange>) -> Self {
        Self {
            phase: BootstrapPhase::AwaitingCount,
            players: IndexMap::new(),
            expected_count: 0,
            groups: Vec::new(),
            reported_groups: Vec::new(),
            dispatcher: Dispatcher::new(),
            outbox,
            changes: Some(changes),
            listening: false,
        }
    }

    /// Begin bootstrap by asking for the player count
    pub fn start(&mut self) -> Result<()> {
        self.set_phase(BootstrapPhase::AwaitingCount);
        self.outbox.send(Command::PlayerCount)
    }

    /// Classify one raw line and apply it
    pub fn handle_line(&mut self, raw: &[u8]) -> Result<()> {
        let event = self.dispatcher.dispatch(raw);
        self.handle_event(event)
    }

    /// Apply one decoded event
    pub fn handle_event(&mut self, event: ProtocolEvent) -> Result<()> {
        match event {
            ProtocolEvent::PlayerCount(count) => self.on_player_count(count),
            ProtocolEvent::PlayerId { index, player } => self.on_identity(index, player),
            ProtocolEvent::SyncGroups(groups) => self.on_sync_groups(groups),
            ProtocolEvent::ListenAck(rest) => {
                debug!("listen acknowledged: {}", rest);
                Ok(())
            }
            ProtocolEvent::Client { player, change } => self.on_client(player, change),
            ProtocolEvent::Player { player, event } => self.on_player_event(player, event),
            ProtocolEvent::Malformed { line, error } => {
                warn!("rejected line {:?}: {}", line, error);
                self.emit(StateChange::ParseFailure {
                    line,
                    error: error.to_string(),
                });
                Ok(())
            }
            ProtocolEvent::Unmatched { player, line } => {
                debug!("unhandled line: {}", line);
                self.emit(StateChange::UnhandledLine {
                    player_id: player,
                    line,
                });
                Ok(())
            }
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn phase(&self) -> BootstrapPhase {
        self.phase
    }

    /// Bootstrap has reached the live phase
    pub fn is_ready(&self) -> bool {
        self.phase.is_live()
    }

    /// Player count last reported by the server, adjusted for arrivals
    /// and departures seen since
    pub fn expected_player_count(&self) -> usize {
        self.expected_count
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    /// Players in registration order
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_ids(&self) -> impl Iterator<Item = &PlayerId> {
        self.players.keys()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Snapshots of every fully known player
    pub fn snapshots(&self) -> Vec<PlayerSnapshot> {
        self.players.values().filter_map(Player::snapshot).collect()
    }

    /// Current partition of known players into sync groups
    pub fn groups(&self) -> &[SyncGroup] {
        &self.groups
    }

    /// The group containing `id`
    pub fn group_of(&self, id: &PlayerId) -> Option<&SyncGroup> {
        self.groups.iter().find(|g| g.contains(id))
    }

    /// Stop publishing changes
    ///
    /// Drops the registry's sender so a [`ChangeIterator`](crate::ChangeIterator)
    /// ends once it has drained what was already queued.
    pub fn close(&mut self) {
        self.changes = None;
    }

    // ========================================================================
    // Event handlers
    // ========================================================================

    fn on_player_count(&mut self, count: usize) -> Result<()> {
        info!("server reports {} player(s), resetting", count);

        self.players.clear();
        self.dispatcher.clear();
        self.expected_count = count;
        self.emit(StateChange::PlayersReset { expected: count });
        self.reported_groups.clear();
        self.replace_groups(Vec::new());
        self.set_phase(BootstrapPhase::AwaitingIdentities);

        for index in 0..count {
            self.outbox.send(Command::PlayerId { index })?;
        }
        self.check_identities_complete()
    }

    fn on_identity(&mut self, index: usize, id: PlayerId) -> Result<()> {
        if self.players.contains_key(&id) {
            debug!("player {} (index {}) already known", id, index);
        } else {
            self.register(id, Some(index))?;
        }
        self.check_identities_complete()
    }

    fn on_sync_groups(&mut self, reported: Vec<SyncGroup>) -> Result<()> {
        self.reported_groups = reported;
        self.regroup();

        if self.phase == BootstrapPhase::AwaitingGroups {
            self.set_phase(BootstrapPhase::Live);
            info!(
                "live: {} player(s) in {} group(s)",
                self.players.len(),
                self.groups.len()
            );

            // Readiness is announced once, together with listen mode
            if !self.listening {
                self.outbox.send(Command::Listen(true))?;
                self.listening = true;
                self.emit(StateChange::Ready {
                    player_count: self.players.len(),
                    group_count: self.groups.len(),
                });
            }
        }
        Ok(())
    }

    fn on_client(&mut self, id: PlayerId, change: ClientChange) -> Result<()> {
        let known = self.players.contains_key(&id);

        match (change, known) {
            (ClientChange::Reconnect, true) => {
                if let Some(snapshot) = self
                    .players
                    .get_mut(&id)
                    .and_then(|p| p.set_connected(true))
                {
                    self.emit(StateChange::PlayerUpdated { snapshot });
                }
                Ok(())
            }
            (ClientChange::New, true) => {
                debug!("client new for known player {}", id);
                Ok(())
            }
            (ClientChange::New | ClientChange::Reconnect, false) => {
                info!("player {} joined", id);
                self.register(id, None)?;
                self.check_identities_complete()
            }
            (ClientChange::Disconnect | ClientChange::Forget, true) => {
                info!("player {} left ({:?})", id, change);
                self.players.shift_remove(&id);
                self.dispatcher.forget(&id);
                self.expected_count = self.expected_count.saturating_sub(1);
                self.forget_reported(&id);
                self.emit(StateChange::PlayerRemoved { player_id: id });
                self.regroup();
                self.outbox.send(Command::SyncGroups)
            }
            (ClientChange::Disconnect | ClientChange::Forget, false) => {
                debug!("{:?} for unknown player {}", change, id);
                Ok(())
            }
        }
    }

    fn on_player_event(&mut self, id: PlayerId, event: PlayerEvent) -> Result<()> {
        if let PlayerEvent::SyncChanged(args) = &event {
            debug!("{} sync {}, re-querying groups", id, args);
            return self.outbox.send(Command::SyncGroups);
        }

        let Some(player) = self.players.get_mut(&id) else {
            warn!("event for unregistered player {}: {:?}", id, event);
            return Ok(());
        };

        if let Some(snapshot) = player.apply(event)? {
            self.emit(StateChange::PlayerUpdated { snapshot });
        }
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn register(&mut self, id: PlayerId, index: Option<usize>) -> Result<()> {
        self.dispatcher.register(&id);
        let player = Player::new(id.clone(), index, self.outbox.clone())?;
        self.players.insert(id.clone(), player);

        if self.phase.is_live() {
            self.expected_count = self.expected_count.max(self.players.len());
        }

        self.emit(StateChange::PlayerAdded { player_id: id });

        if self.phase.is_live() {
            self.regroup();
        }
        Ok(())
    }

    fn check_identities_complete(&mut self) -> Result<()> {
        if self.phase == BootstrapPhase::AwaitingIdentities
            && self.players.len() >= self.expected_count
        {
            self.set_phase(BootstrapPhase::AwaitingGroups);
            self.outbox.send(Command::SyncGroups)?;
        }
        Ok(())
    }

    /// Drop a departed player from the last listing, and any group it empties
    fn forget_reported(&mut self, id: &PlayerId) {
        self.reported_groups = self
            .reported_groups
            .iter()
            .filter_map(|group| {
                let members: Vec<PlayerId> = group
                    .members()
                    .iter()
                    .filter(|m| *m != id)
                    .cloned()
                    .collect();
                (!members.is_empty()).then(|| SyncGroup::new(members))
            })
            .collect();
    }

    fn regroup(&mut self) {
        let groups = reconcile_groups(&self.reported_groups, self.players.keys());
        self.replace_groups(groups);
    }

    fn replace_groups(&mut self, groups: Vec<SyncGroup>) {
        if groups != self.groups {
            self.groups = groups;
            self.emit(StateChange::GroupsChanged {
                groups: self.groups.clone(),
            });
        }
    }

    fn set_phase(&mut self, phase: BootstrapPhase) {
        if self.phase != phase {
            info!("bootstrap: {} -> {}", self.phase, phase);
        }
        self.phase = phase;
    }

    fn emit(&self, change: StateChange) {
        let Some(changes) = &self.changes else {
            return;
        };
        if changes.send(change).is_err() {
            tracing::trace!("no change listener");
        }
    }
}
