//! Replication event model.
//!
//! Every discrete state transition an authoritative peer makes to an ability
//! entity is published exactly once as a [`ReplicationEvent`]. Events are
//! immutable once emitted; continuous position data flows separately through
//! [`crate::snapshot`] (except teleports, which are discrete by design and
//! travel as events).

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ids::{AbilityId, EntityId, PlayerId, UnitId};

/// Who a published event is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Every peer, the sender included (loopback delivery).
    All,
    /// Every peer except the sender.
    OthersOnly,
    /// Exactly one peer.
    Peer(PlayerId),
}

/// A discrete, replicated state transition.
///
/// `seq` is monotone per entity; receivers use it to drop duplicates and
/// detect reordering. Cross-entity ordering is never guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationEvent {
    /// The entity the transition belongs to.
    pub entity: EntityId,
    /// Per-entity sequence number, assigned at emission.
    pub seq: u32,
    /// What happened.
    pub kind: EventKind,
}

/// The transition payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// A new ability entity exists. Always the first event for an entity;
    /// receiving it twice must not double-spawn.
    Spawned {
        /// Which registered ability this entity runs.
        ability: AbilityId,
        /// Initial position.
        position: Vec3,
        /// Initial heading, degrees.
        yaw: f32,
        /// Per-tick yaw curve applied by the caster.
        curve: f32,
    },
    /// The entity entered its teardown window. Mirrors stop interacting and
    /// destroy themselves after the ability's grace period.
    Died,
    /// Authoritative position/heading sample for mirror interpolation.
    PositionSync {
        /// Sampled position.
        position: Vec3,
        /// Sampled heading, degrees.
        yaw: f32,
    },
    /// A unit was moved discretely. Never interpolated.
    Teleported {
        /// The moved unit.
        unit: UnitId,
        /// Destination.
        position: Vec3,
    },
    /// Apply an impulse to a unit simulated by the addressed peer. Force is
    /// only ever applied by the peer that owns the target unit.
    Knockback {
        /// The pushed unit.
        unit: UnitId,
        /// Impulse vector.
        force: Vec3,
    },
    /// The entity struck something and resolved an area effect.
    Hit {
        /// Primary target, if the contact was a unit.
        target: Option<UnitId>,
        /// Where the effect resolved.
        position: Vec3,
    },
    /// A tether anchored to a unit.
    Hooked {
        /// The hooked unit.
        unit: UnitId,
    },
    /// A tether recast triggered its pull.
    PullTriggered,
    /// A tether or grapple released its anchor.
    Detached,
    /// A tether landed on terrain and anchored there.
    SurfaceAnchored {
        /// Anchor point.
        position: Vec3,
    },
    /// A hooked unit was thrown.
    ThrowLaunched {
        /// The thrown unit.
        unit: UnitId,
        /// Launch velocity.
        velocity: Vec3,
    },
    /// A thrown unit landed and the slam resolved.
    SlamLanded {
        /// Landing point.
        position: Vec3,
    },
    /// A grapple stuck to its first target.
    Stuck {
        /// The anchor unit.
        anchor: UnitId,
    },
    /// The grapple's second-target candidate changed during its rescan.
    TargetPreview {
        /// Current candidate, if any.
        candidate: Option<UnitId>,
    },
    /// A grapple began pulling two units together.
    Chained {
        /// The anchor unit.
        first: UnitId,
        /// The scanned second unit.
        second: UnitId,
    },
    /// A grapple detonated at the midpoint.
    Detonated {
        /// Detonation point.
        position: Vec3,
        /// The anchor unit; its owning peer zeroes its velocity.
        first: UnitId,
        /// The chained second unit; likewise.
        second: UnitId,
    },
    /// A ward claimed an attacker and started its deflect flight.
    WardDeflect {
        /// The claimed attacker.
        attacker: PlayerId,
    },
    /// A ward arrived at its attacker and entered its block window.
    WardBlock {
        /// The attacker's unit being held.
        attacker_unit: UnitId,
    },
    /// One teleport-strike attack step resolved.
    StrikeStep {
        /// The struck unit.
        target: UnitId,
        /// Teleport destination for this step.
        position: Vec3,
    },
}
