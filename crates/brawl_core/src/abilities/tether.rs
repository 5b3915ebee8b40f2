//! Tether: a hook that launches with the caster, anchors to terrain or an
//! enemy, spring-pulls, and throws.
//!
//! While flying the tether drives the caster's velocity forward; it is the
//! movement ability. Recasting the slot while one tether is live never
//! spawns a second one - the session routes the recast here instead:
//! a straight recast triggers the pull, a strongly curved one detaches.

use brawl_net::{EventKind, UnitId};
use glam::Vec3;

use crate::entity::AbilityEntity;
use crate::hit::HitDecision;
use crate::math;
use crate::session::secs_to_ticks;
use crate::spatial::Filter;

use super::{apply_single_damage, die, resolve_area, travel, StepCtx};

/// Where the tether is in its life.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TetherPhase {
    /// Launched with the caster, driving their velocity.
    Flying,
    /// Anchored to terrain; waiting for the pull recast or the timer.
    Surface {
        /// Anchor point.
        anchor: Vec3,
    },
    /// Anchored to an enemy unit, spring-pulling it toward the caster.
    Hooked {
        /// The hooked unit.
        unit: UnitId,
    },
    /// Pull recast received; launching the hooked unit shortly.
    Throwing {
        /// The hooked unit.
        unit: UnitId,
        /// Tick of the launch.
        launch_at: u64,
    },
    /// Thrown unit is in the air; the slam resolves where it lands.
    AwaitLanding {
        /// The thrown unit.
        unit: UnitId,
        /// Whether the unit has actually left the ground yet.
        airborne: bool,
        /// Landings cannot register before this tick.
        grace_until: u64,
    },
}

/// Tether machine state.
#[derive(Debug, Clone, Copy)]
pub struct TetherState {
    /// Current phase.
    pub phase: TetherPhase,
}

impl Default for TetherState {
    fn default() -> Self {
        Self {
            phase: TetherPhase::Flying,
        }
    }
}

fn state(entity: &mut AbilityEntity) -> &mut TetherState {
    match &mut entity.state {
        super::AbilityState::Tether(s) => s,
        _ => unreachable!("tether step on non-tether entity"),
    }
}

/// One authoritative tick.
pub fn step(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity) {
    if !entity.is_alive() {
        return;
    }
    let params = ctx.def.tether.expect("tether entity without tether params");

    let phase = state(entity).phase;
    match phase {
        TetherPhase::Flying => {
            let Some(caster_unit) = ctx.world.caster_unit(entity.caster) else {
                die(ctx, entity);
                return;
            };
            // The travel shape steers the hook; the caster is dragged along
            // by having their velocity overwritten each tick.
            travel(entity, ctx.def.accel);
            let dir = math::yaw_to_dir(entity.yaw);
            ctx.world.set_unit_velocity(caster_unit, dir * entity.speed);
            if let Some(pos) = ctx.world.unit_position(caster_unit) {
                entity.position = pos;
            }
        }
        TetherPhase::Surface { .. } => {
            // Anchored and idle: only the recast or the death timer moves
            // things forward.
        }
        TetherPhase::Hooked { unit } => {
            let (Some(unit_pos), Some(caster_pos)) = (
                ctx.spatial.position_of(unit),
                caster_position(ctx, entity),
            ) else {
                die(ctx, entity);
                return;
            };
            entity.position = unit_pos;
            let force = params.spring.pull(unit_pos, caster_pos);
            if force != Vec3::ZERO {
                ctx.apply_force(entity.id, unit, force);
            }
        }
        TetherPhase::Throwing { unit, launch_at } => {
            if ctx.now < launch_at {
                return;
            }
            let (Some(unit_pos), Some(caster_pos)) = (
                ctx.spatial.position_of(unit),
                caster_position(ctx, entity),
            ) else {
                die(ctx, entity);
                return;
            };
            let velocity =
                (caster_pos - unit_pos) * params.throw_multiplier + Vec3::Y * params.throw_lift;
            if ctx.world.is_local_unit(unit) {
                ctx.world.set_unit_velocity(unit, velocity);
            }
            ctx.publish(entity.id, EventKind::ThrowLaunched { unit, velocity });
            state(entity).phase = TetherPhase::AwaitLanding {
                unit,
                airborne: false,
                grace_until: ctx.now + secs_to_ticks(params.land_grace),
            };
        }
        TetherPhase::AwaitLanding {
            unit,
            airborne,
            grace_until,
        } => {
            if ctx.now < grace_until {
                return;
            }
            let Some(unit_pos) = ctx.world.unit_position(unit) else {
                die(ctx, entity);
                return;
            };
            if !ctx.world.unit_grounded(unit) {
                state(entity).phase = TetherPhase::AwaitLanding {
                    unit,
                    airborne: true,
                    grace_until,
                };
            } else if airborne {
                // Landed: slam damage to everyone around the impact, force
                // to everyone except the thrown unit itself.
                resolve_area(
                    ctx,
                    entity,
                    unit_pos,
                    None,
                    params.slam_damage,
                    ctx.def.power,
                    Filter::default().without_unit(unit),
                );
                apply_single_damage(ctx, entity, unit, params.slam_damage);
                ctx.publish(entity.id, EventKind::SlamLanded { position: unit_pos });
                die(ctx, entity);
            }
        }
    }
}

/// The pull recast: relaunch toward a surface anchor, or start throwing a
/// hooked unit. Logged and ignored in any other phase.
pub fn trigger_pull(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity) {
    if !entity.is_alive() {
        return;
    }
    let params = ctx.def.tether.expect("tether entity without tether params");
    match state(entity).phase {
        TetherPhase::Surface { anchor } => {
            if let Some(caster_unit) = ctx.world.caster_unit(entity.caster) {
                if let Some(caster_pos) = ctx.world.unit_position(caster_unit) {
                    let delta = anchor - caster_pos;
                    if delta.length_squared() > f32::EPSILON {
                        ctx.world
                            .set_unit_velocity(caster_unit, delta.normalize() * ctx.def.speed);
                    }
                }
            }
            ctx.publish(entity.id, EventKind::PullTriggered);
            die(ctx, entity);
        }
        TetherPhase::Hooked { unit } => {
            state(entity).phase = TetherPhase::Throwing {
                unit,
                launch_at: ctx.now + secs_to_ticks(params.throw_delay),
            };
            ctx.publish(entity.id, EventKind::PullTriggered);
        }
        other => {
            tracing::warn!(entity = %entity.id, ?other, "Pull recast in inapplicable phase, ignoring");
        }
    }
}

/// Detach recast: release whatever is anchored, with no residual force and
/// no further damage, then tear down.
pub fn detach(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity) {
    if !entity.is_alive() {
        return;
    }
    ctx.publish(entity.id, EventKind::Detached);
    die(ctx, entity);
}

/// Unit contact while flying hooks the unit: one contact damage tick, then
/// the spring takes over.
pub fn on_unit_contact(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity, unit: UnitId) {
    if !entity.is_alive() || state(entity).phase != TetherPhase::Flying {
        return;
    }
    match entity.guard.offer(unit, ctx.now) {
        HitDecision::Hit => {}
        HitDecision::Deferred | HitDecision::AlreadyHit => return,
    }
    let params = ctx.def.tether.expect("tether entity without tether params");
    apply_single_damage(ctx, entity, unit, ctx.def.damage);
    entity.death_deadline = ctx.now + secs_to_ticks(params.hook_duration);
    state(entity).phase = TetherPhase::Hooked { unit };
    ctx.publish(entity.id, EventKind::Hooked { unit });
    // Stop dragging the caster the moment the hook lands.
    if let Some(caster_unit) = ctx.world.caster_unit(entity.caster) {
        ctx.world.set_unit_velocity(caster_unit, Vec3::ZERO);
    }
}

/// Terrain contact while flying anchors the tether there.
pub fn on_surface_contact(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity) {
    if !entity.is_alive() || state(entity).phase != TetherPhase::Flying {
        return;
    }
    let anchor = entity.position;
    state(entity).phase = TetherPhase::Surface { anchor };
    ctx.publish(entity.id, EventKind::SurfaceAnchored { position: anchor });
    if let Some(caster_unit) = ctx.world.caster_unit(entity.caster) {
        ctx.world.set_unit_velocity(caster_unit, Vec3::ZERO);
    }
}

fn caster_position(ctx: &StepCtx<'_>, entity: &AbilityEntity) -> Option<Vec3> {
    let unit = ctx.world.caster_unit(entity.caster)?;
    ctx.world.unit_position(unit)
}
