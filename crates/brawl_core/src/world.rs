//! The host-world seam.
//!
//! The engine never owns units, health, or rigid bodies; it reads and
//! mutates them through [`GameWorld`], implemented by the embedding game.
//! Every unit reference is a weak id resolved per call - the referent may
//! have despawned since last tick, and every position lookup returning
//! `None` must degrade the caller gracefully (usually into teardown).

use brawl_net::{AbilityId, PlayerId, UnitId};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Coarse unit classification, used for query exclusions (a homing
/// projectile retargets wizards, never crystals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// A player-controlled caster.
    Wizard,
    /// A destructible objective.
    Crystal,
    /// Anything else damageable.
    Creature,
}

/// Opaque damage attribution carried through [`GameWorld::apply_damage`]
/// to the host's kill/assist bookkeeping. The engine never inspects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CauseTag(pub u16);

impl From<AbilityId> for CauseTag {
    fn from(id: AbilityId) -> Self {
        Self(id.0)
    }
}

/// Everything the simulation needs from the embedding game.
///
/// Damage application returns the amount actually applied after the host's
/// mitigation; the engine forwards that figure into the damage feed so
/// wards and strike marks see post-mitigation numbers.
pub trait GameWorld {
    /// All living units, order unspecified.
    fn units(&self) -> Vec<UnitId>;

    /// Current position of a unit, if it still exists.
    fn unit_position(&self, unit: UnitId) -> Option<Vec3>;

    /// The player a unit belongs to, if any.
    fn unit_owner(&self, unit: UnitId) -> Option<PlayerId>;

    /// Classification for query exclusions.
    fn unit_kind(&self, unit: UnitId) -> Option<UnitKind>;

    /// The caster unit of a player, if they are alive.
    fn caster_unit(&self, player: PlayerId) -> Option<UnitId>;

    /// Whether this peer simulates the unit's rigid body. Forces are only
    /// ever applied to local units; remote ones get a Knockback event.
    fn is_local_unit(&self, unit: UnitId) -> bool;

    /// Whether the unit is standing on the ground.
    fn unit_grounded(&self, unit: UnitId) -> bool;

    /// Current velocity of a locally simulated unit.
    fn unit_velocity(&self, unit: UnitId) -> Option<Vec3>;

    /// Apply damage; returns the post-mitigation amount actually dealt.
    fn apply_damage(&mut self, unit: UnitId, amount: f32, source: PlayerId, cause: CauseTag)
        -> f32;

    /// Apply an impulse to a locally simulated unit.
    fn add_unit_force(&mut self, unit: UnitId, force: Vec3);

    /// Overwrite a locally simulated unit's velocity.
    fn set_unit_velocity(&mut self, unit: UnitId, velocity: Vec3);

    /// Discretely move a unit (teleport). Never interpolated.
    fn set_unit_position(&mut self, unit: UnitId, position: Vec3);
}
