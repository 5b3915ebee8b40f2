//! A scripted in-memory [`GameWorld`] for tests.
//!
//! Units are plain records; physics is whatever the test scripts between
//! ticks. Damage is logged rather than mitigated, so assertions can check
//! exactly what the engine applied and to whom.

use std::collections::BTreeMap;

use brawl_core::world::{CauseTag, GameWorld, UnitKind};
use brawl_net::{PlayerId, UnitId};
use glam::Vec3;

/// One scripted unit.
#[derive(Debug, Clone, Copy)]
pub struct StubUnit {
    /// Current position.
    pub position: Vec3,
    /// Current velocity. Integration is the test's job.
    pub velocity: Vec3,
    /// Owning player, if any.
    pub owner: Option<PlayerId>,
    /// Classification.
    pub kind: UnitKind,
    /// Whether the unit is on the ground.
    pub grounded: bool,
    /// Whether this peer simulates the unit's body.
    pub local: bool,
    /// Remaining health.
    pub hp: f32,
}

impl StubUnit {
    /// A grounded, locally simulated wizard at `position`.
    #[must_use]
    pub fn wizard(owner: PlayerId, position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            owner: Some(owner),
            kind: UnitKind::Wizard,
            grounded: true,
            local: true,
            hp: 100.0,
        }
    }

    /// An unowned crystal at `position`.
    #[must_use]
    pub fn crystal(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            owner: None,
            kind: UnitKind::Crystal,
            grounded: true,
            local: true,
            hp: 100.0,
        }
    }

    /// Mark the unit as simulated by some other peer.
    #[must_use]
    pub fn remote(mut self) -> Self {
        self.local = false;
        self
    }

    /// Set the unit airborne.
    #[must_use]
    pub fn airborne(mut self) -> Self {
        self.grounded = false;
        self
    }
}

/// One logged damage application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageEntry {
    /// The damaged unit.
    pub unit: UnitId,
    /// Amount applied.
    pub amount: f32,
    /// Attributed player.
    pub source: PlayerId,
    /// Attribution tag.
    pub cause: CauseTag,
}

/// Scripted world. `BTreeMap` so `units()` is deterministic.
#[derive(Debug, Clone, Default)]
pub struct StubWorld {
    units: BTreeMap<UnitId, StubUnit>,
    /// Every damage application, in order.
    pub damage_log: Vec<DamageEntry>,
}

impl StubWorld {
    /// Empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit.
    pub fn add_unit(&mut self, id: UnitId, unit: StubUnit) {
        self.units.insert(id, unit);
    }

    /// Remove a unit, simulating a despawn mid-flight.
    pub fn remove_unit(&mut self, id: UnitId) {
        self.units.remove(&id);
    }

    /// Direct access for scripting and assertions.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&StubUnit> {
        self.units.get(&id)
    }

    /// Mutable access for scripting.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut StubUnit> {
        self.units.get_mut(&id)
    }

    /// Total damage logged against one unit.
    #[must_use]
    pub fn damage_to(&self, unit: UnitId) -> f32 {
        self.damage_log
            .iter()
            .filter(|e| e.unit == unit)
            .map(|e| e.amount)
            .sum()
    }
}

impl GameWorld for StubWorld {
    fn units(&self) -> Vec<UnitId> {
        self.units.keys().copied().collect()
    }

    fn unit_position(&self, unit: UnitId) -> Option<Vec3> {
        self.units.get(&unit).map(|u| u.position)
    }

    fn unit_owner(&self, unit: UnitId) -> Option<PlayerId> {
        self.units.get(&unit).and_then(|u| u.owner)
    }

    fn unit_kind(&self, unit: UnitId) -> Option<UnitKind> {
        self.units.get(&unit).map(|u| u.kind)
    }

    fn caster_unit(&self, player: PlayerId) -> Option<UnitId> {
        self.units
            .iter()
            .find(|(_, u)| u.owner == Some(player) && u.kind == UnitKind::Wizard)
            .map(|(id, _)| *id)
    }

    fn is_local_unit(&self, unit: UnitId) -> bool {
        self.units.get(&unit).is_some_and(|u| u.local)
    }

    fn unit_grounded(&self, unit: UnitId) -> bool {
        self.units.get(&unit).is_some_and(|u| u.grounded)
    }

    fn unit_velocity(&self, unit: UnitId) -> Option<Vec3> {
        self.units.get(&unit).map(|u| u.velocity)
    }

    fn apply_damage(
        &mut self,
        unit: UnitId,
        amount: f32,
        source: PlayerId,
        cause: CauseTag,
    ) -> f32 {
        let Some(u) = self.units.get_mut(&unit) else {
            return 0.0;
        };
        u.hp -= amount;
        self.damage_log.push(DamageEntry {
            unit,
            amount,
            source,
            cause,
        });
        amount
    }

    fn add_unit_force(&mut self, unit: UnitId, force: Vec3) {
        if let Some(u) = self.units.get_mut(&unit) {
            u.velocity += force;
        }
    }

    fn set_unit_velocity(&mut self, unit: UnitId, velocity: Vec3) {
        if let Some(u) = self.units.get_mut(&unit) {
            u.velocity = velocity;
        }
    }

    fn set_unit_position(&mut self, unit: UnitId, position: Vec3) {
        if let Some(u) = self.units.get_mut(&unit) {
            u.position = position;
        }
    }
}
