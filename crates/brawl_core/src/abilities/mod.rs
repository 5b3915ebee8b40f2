//! The six ability state machines.
//!
//! Every machine shares the same travel shape - straight flight with a
//! per-tick yaw curve, an acceleration multiplier, a death timer, and
//! collision checks - and differs in what happens around it. Machines are
//! plain functions over [`AbilityEntity`] plus a [`StepCtx`]; the session
//! owns ordering, authority gating, and replication draining.

pub mod bolt;
pub mod grapple;
pub mod homing;
pub mod strike;
pub mod tether;
pub mod ward;

use brawl_net::{EntityId, EventChannel, EventKind, PlayerId, Scope, UnitId};
use glam::Vec3;

use crate::catalog::AbilityDef;
use crate::entity::AbilityEntity;
use crate::hit::{apply_area_effect, AreaEffect};
use crate::math;
use crate::notify::{DamageFeed, DamageNotice};
use crate::session::{secs_to_ticks, TICK_SECONDS};
use crate::spatial::{Filter, SpatialIndex};
use crate::world::GameWorld;

/// Machine-specific state, one variant per machine.
#[derive(Debug, Clone)]
pub enum AbilityState {
    /// Straight projectile.
    Bolt(bolt::BoltState),
    /// Retargeting projectile.
    Homing(homing::HomingState),
    /// Hook, spring, throw.
    Tether(tether::TetherState),
    /// Damage-reactive shield.
    Ward(ward::WardState),
    /// Mark-and-teleport chain.
    Strike(strike::StrikeState),
    /// Stick, chain, detonate.
    Grapple(grapple::GrappleState),
}

/// A follow-up cast requested by a machine, spawned by the session at the
/// start of the next tick.
#[derive(Debug, Clone, Copy)]
pub struct FollowUp {
    /// Ability to cast.
    pub ability: brawl_net::AbilityId,
    /// Player credited with the cast.
    pub caster: PlayerId,
    /// Spawn position.
    pub position: Vec3,
    /// Spawn heading, degrees.
    pub yaw: f32,
}

/// Everything a machine step can touch.
pub struct StepCtx<'a> {
    /// The host world.
    pub world: &'a mut dyn GameWorld,
    /// This tick's unit snapshot.
    pub spatial: &'a SpatialIndex,
    /// Current tick.
    pub now: u64,
    /// The entity's definition (re-resolved every tick, so re-registration
    /// takes effect immediately).
    pub def: &'a AbilityDef,
    /// Replication outbox.
    pub channel: &'a mut EventChannel,
    /// Damage-notification registry.
    pub feed: &'a mut DamageFeed,
    /// This peer.
    pub local: PlayerId,
    /// Damage applied this tick, dispatched through the feed afterwards.
    pub damage: &'a mut Vec<DamageNotice>,
    /// Deferred casts.
    pub follow_ups: &'a mut Vec<FollowUp>,
}

impl StepCtx<'_> {
    /// Publish an event for `entity` to everyone but this peer.
    pub fn publish(&mut self, entity: EntityId, kind: EventKind) {
        self.channel
            .publish(self.local, Scope::OthersOnly, entity, kind);
    }

    /// Publish an event addressed to a single peer.
    pub fn publish_to(&mut self, peer: PlayerId, entity: EntityId, kind: EventKind) {
        self.channel
            .publish(self.local, Scope::Peer(peer), entity, kind);
    }

    /// Push a unit toward a direction: directly when this peer simulates
    /// the unit, otherwise as a Knockback event to the peer that does.
    pub fn apply_force(&mut self, entity: EntityId, unit: UnitId, force: Vec3) {
        if self.world.is_local_unit(unit) {
            self.world.add_unit_force(unit, force);
        } else if let Some(owner) = self.world.unit_owner(unit) {
            self.publish_to(owner, entity, EventKind::Knockback { unit, force });
        }
    }
}

/// Advance an entity along its travel shape for one tick: apply the yaw
/// curve, the speed multiplier, then integrate position.
pub fn travel(entity: &mut AbilityEntity, speed_multiplier: f32) {
    entity.yaw = math::wrap_yaw(entity.yaw + entity.curve);
    entity.speed *= speed_multiplier;
    entity.position += math::yaw_to_dir(entity.yaw) * entity.speed * TICK_SECONDS;
}

/// Enter the teardown window: publish `Died`, release every feed
/// subscription, start the grace timer. No-ops on an already dying entity.
pub fn die(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity) {
    let until = ctx.now + secs_to_ticks(ctx.def.teardown);
    if entity.begin_dying(until) {
        tracing::debug!(entity = %entity.id, ability = %ctx.def.name, tick = ctx.now, "Entity dying");
        ctx.feed.unsubscribe_all(entity.id);
        ctx.publish(entity.id, EventKind::Died);
    }
}

/// Resolve an area effect for a machine: damage plus knockback, with the
/// caster's own units excluded, and every application recorded for the
/// damage feed.
pub fn resolve_area(
    ctx: &mut StepCtx<'_>,
    entity: &AbilityEntity,
    center: Vec3,
    primary: Option<UnitId>,
    full_damage: f32,
    power: f32,
    extra_filter: Filter,
) -> Vec<UnitId> {
    let mut filter = extra_filter;
    filter.exclude_owner = Some(entity.caster);
    let fx = AreaEffect {
        center,
        radius: ctx.def.radius,
        primary,
        full_damage,
        splash_fraction: ctx.def.splash_fraction,
        power,
        source: entity.caster,
        cause: entity.ability.into(),
        filter: &filter,
    };
    let (records, knockbacks) = apply_area_effect(ctx.world, ctx.spatial, entity.id, &fx);
    for (scope, kind) in knockbacks {
        ctx.channel.publish(ctx.local, scope, entity.id, kind);
    }
    let attacker_unit = ctx.world.caster_unit(entity.caster);
    let mut hit_units = Vec::with_capacity(records.len());
    for record in records {
        hit_units.push(record.unit);
        if let Some(victim) = ctx.world.unit_owner(record.unit) {
            ctx.damage.push(DamageNotice {
                attacker: entity.caster,
                attacker_unit,
                victim,
                victim_unit: record.unit,
                amount: record.amount,
            });
        }
    }
    hit_units
}

/// Dispatch one authoritative tick to the entity's machine.
pub fn step_machine(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity) {
    match entity.state {
        AbilityState::Bolt(_) => bolt::step(ctx, entity),
        AbilityState::Homing(_) => homing::step(ctx, entity),
        AbilityState::Tether(_) => tether::step(ctx, entity),
        AbilityState::Ward(_) => ward::step(ctx, entity),
        AbilityState::Strike(_) => strike::step(ctx, entity),
        AbilityState::Grapple(_) => grapple::step(ctx, entity),
    }
}

/// Dispatch a begin-contact to the entity's machine. Wards and strikes do
/// not react to collisions at all.
pub fn contact_machine(
    ctx: &mut StepCtx<'_>,
    entity: &mut AbilityEntity,
    contact: crate::session::ContactKind,
) {
    use crate::session::ContactKind;
    match (&entity.state, contact) {
        (AbilityState::Bolt(_), ContactKind::Unit(u)) => bolt::on_unit_contact(ctx, entity, u),
        (AbilityState::Bolt(_), ContactKind::Surface) => bolt::on_surface_contact(ctx, entity),
        (AbilityState::Homing(_), ContactKind::Unit(u)) => homing::on_unit_contact(ctx, entity, u),
        (AbilityState::Homing(_), ContactKind::Surface) => homing::on_surface_contact(ctx, entity),
        (AbilityState::Tether(_), ContactKind::Unit(u)) => tether::on_unit_contact(ctx, entity, u),
        (AbilityState::Tether(_), ContactKind::Surface) => tether::on_surface_contact(ctx, entity),
        (AbilityState::Grapple(_), ContactKind::Unit(u)) => {
            grapple::on_unit_contact(ctx, entity, u);
        }
        (AbilityState::Grapple(_), ContactKind::Surface) => {
            grapple::on_surface_contact(ctx, entity);
        }
        (AbilityState::Ward(_) | AbilityState::Strike(_), _) => {}
    }
}

/// Apply single-target damage and record it for the feed.
pub fn apply_single_damage(
    ctx: &mut StepCtx<'_>,
    entity: &AbilityEntity,
    unit: UnitId,
    amount: f32,
) {
    let applied = ctx
        .world
        .apply_damage(unit, amount, entity.caster, entity.ability.into());
    let attacker_unit = ctx.world.caster_unit(entity.caster);
    if let Some(victim) = ctx.world.unit_owner(unit) {
        ctx.damage.push(DamageNotice {
            attacker: entity.caster,
            attacker_unit,
            victim,
            victim_unit: unit,
            amount: applied,
        });
    }
}
