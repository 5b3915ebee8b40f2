//! Homing chain: straight flight, then a second life chasing a new target.
//!
//! On its first valid hit the projectile does not die - it extends its
//! death timer, scans for the nearest other unit in the retarget radius,
//! and steers toward it with a bounded per-tick angular step that grows
//! slightly each tick. The hit-once guard is per contact instance, so the
//! two sequential hits on two different units are both legitimate.

use brawl_net::{EventKind, UnitId};

use crate::entity::AbilityEntity;
use crate::hit::HitDecision;
use crate::math;
use crate::session::secs_to_ticks;
use crate::spatial::Filter;
use crate::world::UnitKind;

use super::{die, resolve_area, travel, StepCtx};

/// Where the projectile is in its chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HomingPhase {
    /// Initial caster-curved flight.
    Straight,
    /// Chasing the retarget pick.
    Homing {
        /// The second target.
        target: UnitId,
        /// Current turn step, degrees per tick.
        step: f32,
    },
}

/// Homing-chain machine state.
#[derive(Debug, Clone, Copy)]
pub struct HomingState {
    /// Current phase.
    pub phase: HomingPhase,
    /// The first struck unit, excluded from retargeting.
    pub struck: Option<UnitId>,
}

impl Default for HomingState {
    fn default() -> Self {
        Self {
            phase: HomingPhase::Straight,
            struck: None,
        }
    }
}

fn state(entity: &mut AbilityEntity) -> &mut HomingState {
    match &mut entity.state {
        super::AbilityState::Homing(s) => s,
        _ => unreachable!("homing step on non-homing entity"),
    }
}

/// One authoritative tick.
pub fn step(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity) {
    if !entity.is_alive() {
        travel(entity, ctx.def.decel);
        return;
    }

    let phase = state(entity).phase;
    match phase {
        HomingPhase::Straight => {
            travel(entity, ctx.def.accel);
        }
        HomingPhase::Homing { target, step } => {
            let Some(target_pos) = ctx.spatial.position_of(target) else {
                // Second target vanished mid-chase.
                die(ctx, entity);
                return;
            };
            if let Some(bearing) = math::bearing(entity.position, target_pos) {
                entity.yaw = math::steer_toward(entity.yaw, bearing, step);
            }
            entity.position +=
                math::yaw_to_dir(entity.yaw) * entity.speed * crate::session::TICK_SECONDS;
            let homing = ctx.def.homing.expect("homing entity without homing params");
            state(entity).phase = HomingPhase::Homing {
                target,
                step: step * homing.turn_accel,
            };
        }
    }

    for unit in entity.guard.take_deferred(ctx.now) {
        on_unit_contact(ctx, entity, unit);
    }
}

/// Unit contact: resolve the area hit, then either chain or die.
pub fn on_unit_contact(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity, unit: UnitId) {
    if !entity.is_alive() {
        return;
    }
    match entity.guard.offer(unit, ctx.now) {
        HitDecision::Hit => {}
        HitDecision::Deferred | HitDecision::AlreadyHit => return,
    }

    let homing = ctx.def.homing.expect("homing entity without homing params");
    resolve_area(
        ctx,
        entity,
        entity.position,
        Some(unit),
        ctx.def.damage,
        ctx.def.power,
        Filter::default(),
    );
    entity
        .guard
        .hold_until(ctx.now + secs_to_ticks(ctx.def.hit_grace));
    ctx.publish(
        entity.id,
        EventKind::Hit {
            target: Some(unit),
            position: entity.position,
        },
    );

    match state(entity).phase {
        HomingPhase::Straight => {
            // First hit: buy time and look for someone else to chase.
            entity.death_deadline = ctx.now + secs_to_ticks(homing.extend);
            state(entity).struck = Some(unit);
            let filter = Filter::default()
                .without_owner(entity.caster)
                .without_unit(unit)
                .without_kind(UnitKind::Crystal);
            match ctx
                .spatial
                .nearest_within(entity.position, homing.retarget_radius, &filter)
            {
                Some(target) if target != unit => {
                    state(entity).phase = HomingPhase::Homing {
                        target,
                        step: homing.turn_rate,
                    };
                }
                _ => die(ctx, entity),
            }
        }
        HomingPhase::Homing { .. } => {
            // Second hit ends the chain, whoever it landed on.
            die(ctx, entity);
        }
    }
}

/// Terrain stops the projectile dead.
pub fn on_surface_contact(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity) {
    if entity.is_alive() {
        die(ctx, entity);
    }
}
