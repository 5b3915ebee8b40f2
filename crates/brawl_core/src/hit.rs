//! Hit resolution: the hit-once guard and area-effect application.
//!
//! The guard enforces at-most-once damage per (entity, target, contact
//! instance). A target leaving contact clears its entry, so a genuine
//! re-entry can hit again; a contact arriving inside the post-hit grace
//! window is cached and retried when the window closes instead of being
//! silently lost.

use std::collections::HashSet;

use brawl_net::{EntityId, EventKind, PlayerId, Scope, UnitId};
use glam::Vec3;

use crate::spatial::{Filter, SpatialIndex};
use crate::world::{CauseTag, GameWorld};

/// Outcome of offering a contact to the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitDecision {
    /// New contact instance: resolve the hit now.
    Hit,
    /// Inside the post-hit grace window: cached for retry.
    Deferred,
    /// This contact instance already hit; ignore until it re-enters.
    AlreadyHit,
}

/// Per-entity hit bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct HitGuard {
    struck: HashSet<UnitId>,
    no_hit_until: u64,
    deferred: Vec<UnitId>,
}

impl HitGuard {
    /// Create an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a contact at tick `now`.
    pub fn offer(&mut self, unit: UnitId, now: u64) -> HitDecision {
        if self.struck.contains(&unit) {
            return HitDecision::AlreadyHit;
        }
        if now < self.no_hit_until {
            if !self.deferred.contains(&unit) {
                self.deferred.push(unit);
            }
            return HitDecision::Deferred;
        }
        self.struck.insert(unit);
        HitDecision::Hit
    }

    /// Open the post-hit grace window until tick `until`.
    pub fn hold_until(&mut self, until: u64) {
        self.no_hit_until = self.no_hit_until.max(until);
    }

    /// Contact ended: the instance is over, a re-entry may hit again. Also
    /// drops any deferred retry for the unit.
    pub fn contact_ended(&mut self, unit: UnitId) {
        self.struck.remove(&unit);
        self.deferred.retain(|&u| u != unit);
    }

    /// Contacts deferred during the grace window, ready for retry once the
    /// window has closed. Empty while the window is still open.
    pub fn take_deferred(&mut self, now: u64) -> Vec<UnitId> {
        if now < self.no_hit_until {
            return Vec::new();
        }
        std::mem::take(&mut self.deferred)
    }

    /// Whether the unit's current contact instance has already hit.
    #[must_use]
    pub fn already_hit(&self, unit: UnitId) -> bool {
        self.struck.contains(&unit)
    }
}

/// One damage application, reported back to the session for the feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRecord {
    /// Who was damaged.
    pub unit: UnitId,
    /// Post-mitigation amount.
    pub amount: f32,
}

/// An area effect about to be resolved.
#[derive(Debug)]
pub struct AreaEffect<'a> {
    /// Effect centre.
    pub center: Vec3,
    /// Effect radius.
    pub radius: f32,
    /// Unit taking full damage; everyone else in the area takes splash.
    pub primary: Option<UnitId>,
    /// Damage to the primary target.
    pub full_damage: f32,
    /// Fraction of full damage for non-primary units.
    pub splash_fraction: f32,
    /// Knockback impulse scale (centre to target direction).
    pub power: f32,
    /// Damage attribution.
    pub source: PlayerId,
    /// Opaque cause threaded to the host.
    pub cause: CauseTag,
    /// Query exclusions (caster's own units, kinds, already-dead anchors).
    pub filter: &'a Filter,
}

/// Events an area effect wants published, returned alongside the damage so
/// the caller owns all replication.
pub type PendingKnockback = (Scope, EventKind);

/// Resolve an area effect.
///
/// Damage goes to every admitted unit in the radius: full to the primary,
/// `splash_fraction` of full to the rest. Knockback is applied directly for
/// units this peer simulates; for remote units a `Knockback` event scoped
/// to the owning peer is returned for publication - force is only ever
/// applied by the peer that owns the target.
pub fn apply_area_effect(
    world: &mut dyn GameWorld,
    spatial: &SpatialIndex,
    _entity: EntityId,
    fx: &AreaEffect<'_>,
) -> (Vec<DamageRecord>, Vec<PendingKnockback>) {
    let mut records = Vec::new();
    let mut knockbacks = Vec::new();

    // The primary struck unit is hit regardless of the filter: once the
    // arming window has passed a caster can be struck by their own cast.
    let mut targets: Vec<(UnitId, f32)> = Vec::new();
    if let Some(primary) = fx.primary {
        if spatial.position_of(primary).is_some() {
            targets.push((primary, fx.full_damage));
        }
    }
    for unit in spatial.query_radius(fx.center, fx.radius, fx.filter) {
        if Some(unit) == fx.primary {
            continue;
        }
        targets.push((unit, fx.full_damage * fx.splash_fraction));
    }

    for (unit, amount) in targets {
        let applied = world.apply_damage(unit, amount, fx.source, fx.cause);
        records.push(DamageRecord {
            unit,
            amount: applied,
        });

        if fx.power > 0.0 {
            if let Some(target_pos) = spatial.position_of(unit) {
                let delta = target_pos - fx.center;
                let dir = if delta.length_squared() > f32::EPSILON {
                    delta.normalize()
                } else {
                    Vec3::Y
                };
                let force = dir * fx.power;
                if world.is_local_unit(unit) {
                    world.add_unit_force(unit, force);
                } else if let Some(owner) = world.unit_owner(unit) {
                    knockbacks.push((Scope::Peer(owner), EventKind::Knockback { unit, force }));
                }
            }
        }
    }

    (records, knockbacks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_hits_once_per_contact_instance() {
        let mut guard = HitGuard::new();
        let u = UnitId(7);
        assert_eq!(guard.offer(u, 10), HitDecision::Hit);
        assert_eq!(guard.offer(u, 11), HitDecision::AlreadyHit);
        assert_eq!(guard.offer(u, 50), HitDecision::AlreadyHit);
    }

    #[test]
    fn contact_exit_allows_reentry_hit() {
        let mut guard = HitGuard::new();
        let u = UnitId(7);
        assert_eq!(guard.offer(u, 10), HitDecision::Hit);
        guard.contact_ended(u);
        assert_eq!(guard.offer(u, 20), HitDecision::Hit);
    }

    #[test]
    fn grace_window_defers_then_replays() {
        let mut guard = HitGuard::new();
        let a = UnitId(1);
        let b = UnitId(2);
        assert_eq!(guard.offer(a, 10), HitDecision::Hit);
        guard.hold_until(15);
        assert_eq!(guard.offer(b, 12), HitDecision::Deferred);
        // Still inside the window: nothing to replay yet.
        assert!(guard.take_deferred(12).is_empty());
        assert_eq!(guard.take_deferred(15), vec![b]);
        assert_eq!(guard.offer(b, 15), HitDecision::Hit);
    }

    #[test]
    fn contact_exit_drops_deferred_retry() {
        let mut guard = HitGuard::new();
        let u = UnitId(3);
        guard.hold_until(20);
        assert_eq!(guard.offer(u, 10), HitDecision::Deferred);
        guard.contact_ended(u);
        assert!(guard.take_deferred(20).is_empty());
    }
}
