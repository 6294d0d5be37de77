//! End-to-end registry scenarios driven by raw server lines

use lms_state::{
    BootstrapPhase, ChangeIterator, Command, Outbox, PlayerId, Registry, StateChange, SyncGroup,
};
use rstest::{fixture, rstest};
use tokio::sync::mpsc::UnboundedReceiver;

const A: &str = "aa:aa:aa:aa:aa:aa";
const B: &str = "bb:bb:bb:bb:bb:bb";
const C: &str = "cc:cc:cc:cc:cc:cc";
const D: &str = "dd:dd:dd:dd:dd:dd";

/// A registry wired to in-memory channels
struct Harness {
    registry: Registry,
    commands: UnboundedReceiver<Command>,
    changes: ChangeIterator,
}

impl Harness {
    fn new() -> Self {
        let (outbox, commands) = Outbox::channel();
        let (tx, changes) = ChangeIterator::channel();
        Self {
            registry: Registry::new(outbox, tx),
            commands,
            changes,
        }
    }

    fn feed(&mut self, lines: &[&str]) {
        for line in lines {
            self.registry.handle_line(line.as_bytes()).unwrap();
        }
    }

    fn sent(&mut self) -> Vec<String> {
        std::iter::from_fn(|| self.commands.try_recv().ok())
            .map(|c| c.to_string())
            .collect()
    }

    fn changes(&self) -> Vec<StateChange> {
        self.changes.try_iter().collect()
    }

    fn groups(&self) -> Vec<Vec<&str>> {
        self.registry
            .groups()
            .iter()
            .map(|g| g.members().iter().map(PlayerId::as_str).collect())
            .collect()
    }

    /// Bootstrap with the given players and listing, then clear queues
    fn live_with(players: &[&str], syncgroups: &str) -> Self {
        let mut h = Harness::new();
        h.registry.start().unwrap();
        h.feed(&[&format!("player count {}", players.len())]);
        for (index, id) in players.iter().enumerate() {
            h.feed(&[&format!("player id {} {}", index, id)]);
        }
        h.feed(&[syncgroups]);
        assert!(h.registry.is_ready());
        h.sent();
        h.changes();
        h
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

fn count_sent(sent: &[String], literal: &str) -> usize {
    sent.iter().filter(|s| s.as_str() == literal).count()
}

#[rstest]
#[case::in_order(&[0, 1, 2])]
#[case::reversed(&[2, 1, 0])]
#[case::shuffled(&[1, 2, 0])]
fn bootstrap_registers_players_and_queries_groups_once(
    mut harness: Harness,
    #[case] order: &[usize],
) {
    let replies = [
        format!("player id 0 {}", A),
        format!("player id 1 {}", B),
        format!("player id 2 {}", C),
    ];

    harness.registry.start().unwrap();
    harness.feed(&["player count 3"]);
    assert_eq!(harness.registry.phase(), BootstrapPhase::AwaitingIdentities);

    for i in order {
        harness.feed(&[&replies[*i]]);
    }

    let ids: Vec<&str> = harness.registry.player_ids().map(PlayerId::as_str).collect();
    assert_eq!(ids.len(), 3);
    for id in [A, B, C] {
        assert!(ids.contains(&id));
    }

    let sent = harness.sent();
    assert_eq!(count_sent(&sent, "player count ?"), 1);
    assert_eq!(count_sent(&sent, "syncgroups ?"), 1);
    for index in 0..3 {
        assert_eq!(count_sent(&sent, &format!("player id {} ?", index)), 1);
    }
    for id in [A, B, C] {
        assert_eq!(count_sent(&sent, &format!("{} name ?", id)), 1);
        assert_eq!(count_sent(&sent, &format!("{} mixer volume ?", id)), 1);
        assert_eq!(count_sent(&sent, &format!("{} connected ?", id)), 1);
    }
    assert_eq!(harness.registry.phase(), BootstrapPhase::AwaitingGroups);
}

#[rstest]
fn first_listing_goes_live_and_listens_once(mut harness: Harness) {
    harness.registry.start().unwrap();
    harness.feed(&["player count 1", &format!("player id 0 {}", A), "syncgroups"]);

    assert!(harness.registry.is_ready());
    assert_eq!(harness.groups(), vec![vec![A]]);

    harness.feed(&["syncgroups"]);
    let sent = harness.sent();
    assert_eq!(count_sent(&sent, "listen 1"), 1);

    let ready: Vec<_> = harness
        .changes()
        .into_iter()
        .filter(|c| matches!(c, StateChange::Ready { .. }))
        .collect();
    assert_eq!(
        ready,
        vec![StateChange::Ready {
            player_count: 1,
            group_count: 1
        }]
    );
}

#[rstest]
fn zero_players_skips_identity_step(mut harness: Harness) {
    harness.registry.start().unwrap();
    harness.feed(&["player count 0"]);

    assert_eq!(harness.registry.phase(), BootstrapPhase::AwaitingGroups);
    assert_eq!(harness.sent(), vec!["player count ?", "syncgroups ?"]);
}

#[test]
fn ungrouped_players_become_singletons() {
    let h = Harness::live_with(
        &[A, B, C, D],
        &format!(
            "syncgroups sync_members:{A},{B} sync_member_names:Kitchen,Den \
             sync_members:{C} sync_member_names:Office"
        ),
    );

    assert_eq!(h.groups(), vec![vec![A, B], vec![C], vec![D]]);
}

#[test]
fn identical_listing_twice_yields_same_partition() {
    let listing = format!(
        "syncgroups sync_members%3A{}%2C{} sync_member_names%3AKitchen%2CDen",
        A.replace(':', "%3A"),
        C.replace(':', "%3A")
    );
    let mut h = Harness::live_with(&[A, B, C], "syncgroups");

    h.feed(&[&listing]);
    let first = h.groups().into_iter().map(|g| g.join(",")).collect::<Vec<_>>();
    h.feed(&[&listing]);
    let second = h.groups().into_iter().map(|g| g.join(",")).collect::<Vec<_>>();

    assert_eq!(first, vec![format!("{A},{C}"), B.to_string()]);
    assert_eq!(first, second);

    let group_changes = h
        .changes()
        .into_iter()
        .filter(|c| matches!(c, StateChange::GroupsChanged { .. }))
        .count();
    assert_eq!(group_changes, 1);
}

#[test]
fn malformed_listing_keeps_prior_partition() {
    let mut h = Harness::live_with(
        &[A, B],
        &format!("syncgroups sync_members:{A},{B} sync_member_names:x,y"),
    );

    h.feed(&["syncgroups sync_members:aa sync_member_names:x garbage"]);

    assert_eq!(h.groups(), vec![vec![A, B]]);
    let changes = h.changes();
    assert_eq!(changes.len(), 1);
    assert!(matches!(changes[0], StateChange::ParseFailure { .. }));
}

#[test]
fn volume_notifications_track_deltas() {
    let mut h = Harness::live_with(&[A], "syncgroups");
    let id = PlayerId::new(A);

    h.feed(&[&format!("{A} mixer volume 50")]);
    assert_eq!(h.registry.player(&id).unwrap().volume(), Some(50));
    h.feed(&[&format!("{A} mixer volume %2B5")]);
    assert_eq!(h.registry.player(&id).unwrap().volume(), Some(55));
    h.feed(&[&format!("{A} mixer volume -10")]);
    assert_eq!(h.registry.player(&id).unwrap().volume(), Some(45));
    h.feed(&[&format!("{A} mixer volume 20")]);
    assert_eq!(h.registry.player(&id).unwrap().volume(), Some(20));
}

#[test]
fn snapshot_emitted_on_third_attribute_then_every_change() {
    let mut h = Harness::live_with(&[A], "syncgroups");

    let updates = |h: &Harness| {
        h.changes()
            .into_iter()
            .filter(|c| matches!(c, StateChange::PlayerUpdated { .. }))
            .count()
    };

    h.feed(&[&format!("{A} connected 1")]);
    h.feed(&[&format!("{A} name Living%20Room")]);
    assert_eq!(updates(&h), 0);

    h.feed(&[&format!("{A} mixer volume 30")]);
    let changes = h.changes();
    assert_eq!(changes.len(), 1);
    match &changes[0] {
        StateChange::PlayerUpdated { snapshot } => {
            assert_eq!(snapshot.name, "Living Room");
            assert_eq!(snapshot.volume, 30);
            assert!(snapshot.connected);
            assert_eq!(snapshot.index, Some(0));
        }
        other => panic!("unexpected change {:?}", other),
    }

    h.feed(&[&format!("{A} connected 0"), &format!("{A} mixer volume +1")]);
    assert_eq!(updates(&h), 2);
}

#[test]
fn unmatched_lines_are_reported_without_mutation() {
    let mut h = Harness::live_with(
        &[A, B],
        &format!("syncgroups sync_members:{A},{B} sync_member_names:x,y"),
    );
    let phase = h.registry.phase();

    h.feed(&[
        "totally unknown line",
        &format!("{D} mixer volume 10"),
        &format!("{A} stop"),
    ]);

    assert_eq!(h.registry.phase(), phase);
    assert_eq!(h.registry.len(), 2);
    assert_eq!(h.groups(), vec![vec![A, B]]);
    assert!(h.sent().is_empty());

    let changes = h.changes();
    assert_eq!(changes.len(), 3);
    assert!(changes.iter().all(StateChange::is_diagnostic));
    assert_eq!(changes[2].player_id(), Some(&PlayerId::new(A)));
}

#[test]
fn count_notification_resets_and_requeries() {
    let mut h = Harness::live_with(&[A, B], "syncgroups");

    h.feed(&["player count 1"]);

    assert_eq!(h.registry.phase(), BootstrapPhase::AwaitingIdentities);
    assert!(h.registry.is_empty());
    assert!(h.registry.groups().is_empty());
    assert_eq!(h.sent(), vec!["player id 0 ?"]);

    h.feed(&[&format!("player id 0 {B}"), "syncgroups"]);
    assert!(h.registry.is_ready());
    assert_eq!(h.groups(), vec![vec![B]]);
    // listen was already on and readiness was already announced
    assert_eq!(count_sent(&h.sent(), "listen 1"), 0);
    assert!(!h
        .changes()
        .iter()
        .any(|c| matches!(c, StateChange::Ready { .. })));
}

#[test]
fn client_new_registers_and_regroups() {
    let mut h = Harness::live_with(&[A], "syncgroups");

    h.feed(&[&format!("{C} client new")]);

    assert_eq!(h.registry.expected_player_count(), 2);
    assert_eq!(h.groups(), vec![vec![A], vec![C]]);
    let sent = h.sent();
    assert_eq!(count_sent(&sent, &format!("{C} name ?")), 1);

    // Now known, so per-player lines route to it
    h.feed(&[&format!("{C} name Porch")]);
    assert_eq!(
        h.registry.player(&PlayerId::new(C)).unwrap().name(),
        Some("Porch")
    );
}

#[test]
fn client_disconnect_removes_and_requeries_groups() {
    let mut h = Harness::live_with(&[A, B], "syncgroups");

    h.feed(&[&format!("{B} client disconnect")]);

    assert!(h.registry.player(&PlayerId::new(B)).is_none());
    assert_eq!(h.registry.expected_player_count(), 1);
    assert_eq!(h.groups(), vec![vec![A]]);
    assert_eq!(h.sent(), vec!["syncgroups ?"]);

    h.feed(&["syncgroups"]);
    assert_eq!(h.groups(), vec![vec![A]]);

    // Lines for the removed address no longer route to a player
    h.feed(&[&format!("{B} mixer volume 5")]);
    assert!(matches!(
        h.changes().last(),
        Some(StateChange::UnhandledLine { player_id: None, .. })
    ));
}

#[test]
fn client_forget_leaves_rest_of_group_intact() {
    let mut h = Harness::live_with(
        &[A, B, C],
        &format!("syncgroups sync_members:{A},{B} sync_member_names:x,y"),
    );

    h.feed(&[&format!("{A} client forget")]);
    assert_eq!(h.groups(), vec![vec![B], vec![C]]);

    h.feed(&[&format!("{B} client disconnect")]);
    assert_eq!(h.groups(), vec![vec![C]]);
}

#[test]
fn client_new_during_identities_still_completes_bootstrap() {
    let mut h = Harness::new();
    h.registry.start().unwrap();

    h.feed(&[
        "player count 2",
        &format!("player id 0 {A}"),
        &format!("{B} client new"),
        &format!("player id 1 {B}"),
    ]);

    assert_eq!(h.registry.len(), 2);
    assert_eq!(h.registry.phase(), BootstrapPhase::AwaitingGroups);
    assert_eq!(count_sent(&h.sent(), "syncgroups ?"), 1);

    h.feed(&["syncgroups"]);
    assert!(h.registry.is_ready());
    assert_eq!(h.groups(), vec![vec![A], vec![B]]);
}

#[test]
fn sync_notification_requeries_groups() {
    let mut h = Harness::live_with(&[A, B], "syncgroups");

    h.feed(&[&format!("{A} sync {B}")]);
    assert_eq!(h.sent(), vec!["syncgroups ?"]);

    h.feed(&[&format!("syncgroups sync_members:{B},{A} sync_member_names:y,x")]);
    assert_eq!(h.groups(), vec![vec![B, A]]);
    assert_eq!(
        h.registry.group_of(&PlayerId::new(A)),
        Some(&SyncGroup::new(vec![PlayerId::new(B), PlayerId::new(A)]))
    );
}

#[test]
fn duplicate_identity_keeps_existing_player() {
    let mut h = Harness::live_with(&[A], "syncgroups");
    h.feed(&[&format!("{A} name Kitchen")]);

    h.feed(&[&format!("player id 0 {A}")]);

    assert_eq!(h.registry.len(), 1);
    assert_eq!(
        h.registry.player(&PlayerId::new(A)).unwrap().name(),
        Some("Kitchen")
    );
    assert!(h.sent().is_empty());
}
