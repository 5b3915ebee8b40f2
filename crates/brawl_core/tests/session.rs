//! Single-session behavior: cast and recast surfaces, tick lifecycle,
//! damage dispatch, and event application for mirrored entities.

use brawl_core::abilities::{ward, AbilityState};
use brawl_core::notify::DamageNotice;
use brawl_core::prelude::*;
use brawl_core::session::ContactPhase;
use brawl_net::{EventKind, Frame, ReplicationEvent, Scope};
use brawl_test_utils::{StubUnit, StubWorld};

const HOMING: AbilityId = AbilityId(1);
const TETHER: AbilityId = AbilityId(3);
const WARD: AbilityId = AbilityId(4);
const BOLT: AbilityId = AbilityId(5);
const STRIKE: AbilityId = AbilityId(6);

fn catalog() -> AbilityCatalog {
    AbilityCatalog::load_default().expect("default table parses")
}

fn two_wizards() -> StubWorld {
    let mut world = StubWorld::new();
    world.add_unit(UnitId(1), StubUnit::wizard(PlayerId(1), Vec3::ZERO));
    world.add_unit(
        UnitId(2),
        StubUnit::wizard(PlayerId(2), Vec3::new(10.0, 0.0, 0.0)),
    );
    world
}

fn session_for(local: u32) -> Session {
    brawl_test_utils::init_test_logging();
    Session::new(PlayerId(local), catalog(), [PlayerId(1), PlayerId(2)])
}

fn cast(session: &mut Session, world: &mut StubWorld, ability: AbilityId) -> EntityId {
    let outcome = session
        .cast(
            world,
            CastParams {
                ability,
                position: Vec3::ZERO,
                yaw: 0.0,
                curve: 0.0,
            },
        )
        .expect("cast succeeds");
    match outcome {
        CastOutcome::Spawned(id) => id,
        other => panic!("expected a spawn, got {other:?}"),
    }
}

#[test]
fn cast_spawns_and_publishes() {
    let mut world = two_wizards();
    let mut session = session_for(1);
    let id = cast(&mut session, &mut world, BOLT);
    assert_eq!(session.entities().len(), 1);
    let frames = session.drain_frames();
    assert!(frames.iter().any(|f| f.event.entity == id
        && matches!(f.event.kind, EventKind::Spawned { ability: BOLT, .. })));
}

#[test]
fn unknown_ability_is_an_error() {
    let mut world = two_wizards();
    let mut session = session_for(1);
    let result = session.cast(
        &mut world,
        CastParams {
            ability: AbilityId(999),
            position: Vec3::ZERO,
            yaw: 0.0,
            curve: 0.0,
        },
    );
    assert!(matches!(result, Err(EngineError::UnknownAbility(_))));
}

#[test]
fn bolt_expires_dies_then_reaps() {
    let mut world = two_wizards();
    let mut session = session_for(1);
    // Spawn away from both wizards so nothing collides.
    world.remove_unit(UnitId(2));
    let id = cast(&mut session, &mut world, BOLT);

    let mut died_at = None;
    let mut destroyed_at = None;
    for t in 0..200 {
        let events = session.tick(&mut world, &[]);
        if events.deaths.contains(&id) {
            died_at = Some(t);
        }
        if events.destroyed.contains(&id) {
            destroyed_at = Some(t);
            break;
        }
    }
    // Lifetime 2s = 60 ticks, teardown 1s = 30 more.
    assert_eq!(died_at, Some(60));
    assert_eq!(destroyed_at, Some(90));
    assert!(session.entities().is_empty());
}

#[test]
fn unit_contact_detonates_and_feeds_damage() {
    let mut world = two_wizards();
    let mut session = session_for(1);
    let id = cast(&mut session, &mut world, BOLT);
    let contact = Contact {
        entity: id,
        kind: ContactKind::Unit(UnitId(2)),
        phase: ContactPhase::Begin,
    };
    let events = session.tick(&mut world, &[contact]);
    assert!((world.damage_to(UnitId(2)) - 10.0).abs() < f32::EPSILON);
    // The contact killed the bolt this very tick; that death belongs to
    // this tick's report, not to no one.
    assert!(events.deaths.contains(&id));
    assert!(events
        .damage
        .iter()
        .any(|n| n.victim == PlayerId(2) && (n.amount - 10.0).abs() < f32::EPSILON));
}

#[test]
fn caster_contact_is_ignored_until_armed() {
    let mut world = two_wizards();
    let mut session = session_for(1);
    let id = cast(&mut session, &mut world, BOLT);
    let contact = Contact {
        entity: id,
        kind: ContactKind::Unit(UnitId(1)),
        phase: ContactPhase::Begin,
    };
    // Arming is 0.17s = 6 ticks; self-contacts before that are dropped.
    for _ in 0..6 {
        session.tick(&mut world, &[contact]);
    }
    assert!(world.damage_to(UnitId(1)).abs() < f32::EPSILON);
    session.tick(&mut world, &[contact]);
    assert!((world.damage_to(UnitId(1)) - 10.0).abs() < f32::EPSILON);
}

#[test]
fn tether_recast_never_double_spawns() {
    let mut world = two_wizards();
    let mut session = session_for(1);
    let id = cast(&mut session, &mut world, TETHER);
    assert_eq!(session.entities().len(), 1);

    // Straight recast: absorbed as the pull.
    let outcome = session
        .cast(
            &mut world,
            CastParams {
                ability: TETHER,
                position: Vec3::ZERO,
                yaw: 0.0,
                curve: 0.0,
            },
        )
        .unwrap();
    assert_eq!(outcome, CastOutcome::TetherPulled(id));
    assert_eq!(session.entities().len(), 1);

    // Strongly curved recast: absorbed as the detach, entity dies.
    let outcome = session
        .cast(
            &mut world,
            CastParams {
                ability: TETHER,
                position: Vec3::ZERO,
                yaw: 0.0,
                curve: 1.0,
            },
        )
        .unwrap();
    assert_eq!(outcome, CastOutcome::TetherDetached(id));
    assert!(!session.get_entity(id).unwrap().is_alive());

    // With the slot free again, the next cast spawns fresh.
    let fresh = cast(&mut session, &mut world, TETHER);
    assert_ne!(fresh, id);
}

#[test]
fn first_ward_claims_second_keeps_catching() {
    let mut world = two_wizards();
    let mut session = session_for(2);
    let first = cast(&mut session, &mut world, WARD);
    let second = cast(&mut session, &mut world, WARD);

    session.notify_damage(DamageNotice {
        attacker: PlayerId(1),
        attacker_unit: Some(UnitId(1)),
        victim: PlayerId(2),
        victim_unit: UnitId(2),
        amount: 5.0,
    });
    session.tick(&mut world, &[]);

    let deflecting = |id: EntityId| {
        matches!(
            session.get_entity(id).unwrap().state,
            AbilityState::Ward(ward::WardState {
                phase: ward::WardPhase::Deflecting { .. }
            })
        )
    };
    assert!(deflecting(first));
    assert!(!deflecting(second));
}

#[test]
fn self_damage_never_triggers_a_ward() {
    let mut world = two_wizards();
    let mut session = session_for(2);
    let id = cast(&mut session, &mut world, WARD);
    session.notify_damage(DamageNotice {
        attacker: PlayerId(2),
        attacker_unit: Some(UnitId(2)),
        victim: PlayerId(2),
        victim_unit: UnitId(2),
        amount: 5.0,
    });
    session.tick(&mut world, &[]);
    assert!(matches!(
        session.get_entity(id).unwrap().state,
        AbilityState::Ward(ward::WardState {
            phase: ward::WardPhase::Catching
        })
    ));
}

#[test]
fn strike_marks_dedup_and_sum() {
    let mut world = two_wizards();
    world.add_unit(
        UnitId(3),
        StubUnit::wizard(PlayerId(2), Vec3::new(-10.0, 0.0, 0.0)),
    );
    let mut session = session_for(1);
    let id = cast(&mut session, &mut world, STRIKE);

    // Cast time 1.3s = 39 ticks; the armed window opens on tick 39.
    for _ in 0..40 {
        session.tick(&mut world, &[]);
    }
    for (unit, amount) in [(UnitId(2), 5.0), (UnitId(2), 3.0), (UnitId(3), 4.0)] {
        session.notify_damage(DamageNotice {
            attacker: PlayerId(1),
            attacker_unit: Some(UnitId(1)),
            victim: PlayerId(2),
            victim_unit: unit,
            amount,
        });
    }
    session.tick(&mut world, &[]);

    let AbilityState::Strike(state) = &session.get_entity(id).unwrap().state else {
        panic!("expected strike state");
    };
    assert_eq!(state.marks.len(), 2);
    assert!((state.marks[0].1 - 8.0).abs() < f32::EPSILON);
    assert!((state.marks[1].1 - 4.0).abs() < f32::EPSILON);
}

fn spawn_frame(sender: u32, seq: u32, entity: EntityId, ability: AbilityId) -> Vec<u8> {
    Frame {
        sender: PlayerId(sender),
        scope: Scope::OthersOnly,
        event: ReplicationEvent {
            entity,
            seq,
            kind: EventKind::Spawned {
                ability,
                position: Vec3::ZERO,
                yaw: 0.0,
                curve: 0.0,
            },
        },
    }
    .encode()
    .unwrap()
}

#[test]
fn duplicate_spawn_events_do_not_double_spawn() {
    let mut world = two_wizards();
    let mut session = session_for(1);
    let remote = EntityId::compose(PlayerId(2), 1);

    let bytes = spawn_frame(2, 1, remote, BOLT);
    session.handle_frame(&mut world, &bytes).unwrap();
    assert_eq!(session.entities().len(), 1);

    // Retransmission of the same sequence: absorbed by the inbox.
    session.handle_frame(&mut world, &bytes).unwrap();
    // A later event re-announcing the spawn: absorbed by the arena.
    let bytes = spawn_frame(2, 2, remote, BOLT);
    session.handle_frame(&mut world, &bytes).unwrap();
    assert_eq!(session.entities().len(), 1);
}

#[test]
fn mirrors_free_run_without_publishing() {
    let mut world = two_wizards();
    let mut session = session_for(1);
    let remote = EntityId::compose(PlayerId(2), 1);
    let bytes = spawn_frame(2, 1, remote, BOLT);
    session.handle_frame(&mut world, &bytes).unwrap();

    session.tick(&mut world, &[]);
    let entity = session.get_entity(remote).unwrap();
    assert!(entity.position.length() > 0.0, "mirror integrates motion");
    let frames = session.drain_frames();
    assert!(
        frames.iter().all(|f| f.event.entity != remote),
        "mirrors never publish"
    );
}

#[test]
fn host_assumes_authority_on_disconnect() {
    let mut world = two_wizards();
    let mut session = session_for(1);
    let remote = EntityId::compose(PlayerId(2), 1);
    let bytes = spawn_frame(2, 1, remote, BOLT);
    session.handle_frame(&mut world, &bytes).unwrap();

    session.player_disconnected(PlayerId(2));
    // Run past the bolt's lifetime: as the new authority this session
    // makes the death decision and announces it.
    let mut died = false;
    for _ in 0..70 {
        let events = session.tick(&mut world, &[]);
        died |= events.deaths.contains(&remote);
    }
    assert!(died);
    assert!(session
        .drain_frames()
        .iter()
        .any(|f| f.event.entity == remote && matches!(f.event.kind, EventKind::Died)));
}

#[test]
fn position_sync_corrects_mirrors_halfway() {
    let mut world = two_wizards();
    let mut session = session_for(1);
    let remote = EntityId::compose(PlayerId(2), 1);
    // A ward has zero travel speed, so free-run leaves it in place.
    let bytes = spawn_frame(2, 1, remote, WARD);
    session.handle_frame(&mut world, &bytes).unwrap();

    let sync = Frame {
        sender: PlayerId(2),
        scope: Scope::OthersOnly,
        event: ReplicationEvent {
            entity: remote,
            seq: 2,
            kind: EventKind::PositionSync {
                position: Vec3::new(10.0, 0.0, 0.0),
                yaw: 0.0,
            },
        },
    }
    .encode()
    .unwrap();
    session.handle_frame(&mut world, &sync).unwrap();
    session.presentation_step();
    let pos = session.get_entity(remote).unwrap().position;
    assert!((pos.x - 5.0).abs() < 1e-6);
}

#[test]
fn events_for_absent_entities_are_ignored() {
    let mut world = two_wizards();
    let mut session = session_for(1);
    let ghost = Frame {
        sender: PlayerId(2),
        scope: Scope::OthersOnly,
        event: ReplicationEvent {
            entity: EntityId::compose(PlayerId(2), 99),
            seq: 1,
            kind: EventKind::Died,
        },
    }
    .encode()
    .unwrap();
    session.handle_frame(&mut world, &ghost).unwrap();
    assert!(session.entities().is_empty());
}

#[test]
fn cancel_player_tears_down_their_casts() {
    let mut world = two_wizards();
    let mut session = session_for(1);
    let a = cast(&mut session, &mut world, BOLT);
    let b = cast(&mut session, &mut world, HOMING);
    session.drain_frames();

    session.cancel_player(PlayerId(1));
    assert!(!session.get_entity(a).unwrap().is_alive());
    assert!(!session.get_entity(b).unwrap().is_alive());
    let frames = session.drain_frames();
    assert_eq!(
        frames
            .iter()
            .filter(|f| matches!(f.event.kind, EventKind::Died))
            .count(),
        2
    );
    // A second cancel publishes nothing: begin_dying is idempotent.
    session.cancel_player(PlayerId(1));
    assert!(session.drain_frames().is_empty());
}

#[test]
fn reap_forgets_replication_state() {
    let mut world = two_wizards();
    let mut session = session_for(1);
    world.remove_unit(UnitId(2));
    let id = cast(&mut session, &mut world, BOLT);
    for _ in 0..=90 {
        session.tick(&mut world, &[]);
    }
    assert!(session.get_entity(id).is_none());
    // A fresh entity reusing the same slot in the channel starts its
    // sequence numbering over.
    let fresh = cast(&mut session, &mut world, BOLT);
    let frames = session.drain_frames();
    let spawn = frames
        .iter()
        .find(|f| f.event.entity == fresh)
        .expect("spawn frame");
    assert_eq!(spawn.event.seq, 1);
}
