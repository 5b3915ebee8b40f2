//! Teleport strike: mark everything the caster damages, then execute the
//! list with a chain of discrete teleports.
//!
//! During the armed window the machine subscribes to the damage feed by
//! attacker and accumulates (unit, damage) marks, deduplicated by unit with
//! the damage summed. Each attack step teleports the caster to one marked
//! unit - a hard position set replicated as an event, never interpolated -
//! and applies the summed damage. Missing targets are skipped and never
//! block the chain.

use brawl_net::{EventKind, UnitId};
use glam::Vec3;

use crate::entity::AbilityEntity;
use crate::math;
use crate::session::secs_to_ticks;

use super::{die, FollowUp, StepCtx};

/// Where the strike is in its sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrikePhase {
    /// Fixed cast time.
    Cast {
        /// End of the cast.
        until: u64,
    },
    /// Armed window: accumulating marks.
    ArmedWait {
        /// End of the window.
        until: u64,
    },
    /// Between the armed window and the first step.
    WindUp {
        /// First step tick.
        until: u64,
    },
    /// Executing the mark list, one target per interval.
    Attack {
        /// Next step tick.
        next_at: u64,
    },
    /// Recovery after the last step.
    WindDown {
        /// End of recovery.
        until: u64,
    },
}

/// Teleport-strike machine state.
#[derive(Debug, Clone)]
pub struct StrikeState {
    /// Current phase.
    pub phase: StrikePhase,
    /// Accumulated (unit, summed damage) marks, execution order.
    pub marks: Vec<(UnitId, f32)>,
    /// Caster position at cast, for the curved return.
    pub start_pos: Vec3,
    /// Absolute cap on the execution; zero until the windup begins.
    pub hard_deadline: u64,
}

impl StrikeState {
    /// Initial state for a cast starting at `now`.
    #[must_use]
    pub fn begin(now: u64, cast_ticks: u64, start_pos: Vec3) -> Self {
        Self {
            phase: StrikePhase::Cast {
                until: now + cast_ticks,
            },
            marks: Vec::new(),
            start_pos,
            hard_deadline: 0,
        }
    }
}

fn state(entity: &mut AbilityEntity) -> &mut StrikeState {
    match &mut entity.state {
        super::AbilityState::Strike(s) => s,
        _ => unreachable!("strike step on non-strike entity"),
    }
}

/// Whether this strike is currently accumulating marks.
#[must_use]
pub fn is_armed(entity: &AbilityEntity) -> bool {
    entity.is_alive()
        && matches!(
            entity.state,
            super::AbilityState::Strike(StrikeState {
                phase: StrikePhase::ArmedWait { .. },
                ..
            })
        )
}

/// Record damage the caster dealt during the armed window. Marks are
/// deduplicated by unit; repeat damage sums onto the existing mark.
pub fn accumulate(entity: &mut AbilityEntity, unit: UnitId, amount: f32) {
    let marks = &mut state(entity).marks;
    if let Some(mark) = marks.iter_mut().find(|(u, _)| *u == unit) {
        mark.1 += amount;
    } else {
        marks.push((unit, amount));
    }
}

/// One authoritative tick.
pub fn step(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity) {
    if !entity.is_alive() {
        return;
    }
    let params = ctx.def.strike.expect("strike entity without strike params");

    // The hard deadline caps the execution once it begins, whatever
    // phase it is in.
    let deadline = state(entity).hard_deadline;
    if deadline > 0 && ctx.now >= deadline {
        die(ctx, entity);
        return;
    }

    let phase = state(entity).phase;
    match phase {
        StrikePhase::Cast { until } => {
            if ctx.now >= until {
                state(entity).phase = StrikePhase::ArmedWait {
                    until: ctx.now + secs_to_ticks(params.wait_window),
                };
            }
        }
        StrikePhase::ArmedWait { until } => {
            if ctx.now >= until {
                if state(entity).marks.is_empty() {
                    die(ctx, entity);
                } else {
                    // The hard cap covers the execution - windup, steps,
                    // winddown - so a huge mark list cannot stall the match.
                    let s = state(entity);
                    s.phase = StrikePhase::WindUp {
                        until: ctx.now + secs_to_ticks(params.windup),
                    };
                    s.hard_deadline = ctx.now + secs_to_ticks(params.hard_deadline);
                }
            }
        }
        StrikePhase::WindUp { until } => {
            if ctx.now >= until {
                state(entity).phase = StrikePhase::Attack { next_at: ctx.now };
            }
        }
        StrikePhase::Attack { next_at } => {
            if ctx.now < next_at {
                return;
            }
            attack_step(ctx, entity, params.strike_offset, params.step_interval);
        }
        StrikePhase::WindDown { until } => {
            if ctx.now >= until {
                die(ctx, entity);
            }
        }
    }
}

/// Execute one attack step: skip vanished targets until a live one is
/// found, teleport to it, apply the summed mark damage, queue the
/// follow-up cast, and schedule the next step.
fn attack_step(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity, offset: f32, interval: f32) {
    let Some(caster_unit) = ctx.world.caster_unit(entity.caster) else {
        die(ctx, entity);
        return;
    };

    loop {
        let Some((unit, amount)) = pop_mark(entity) else {
            finish_attack(ctx, entity, caster_unit);
            return;
        };
        let Some(target_pos) = ctx.world.unit_position(unit) else {
            // Mark died before its turn; on to the next.
            continue;
        };

        let from = ctx
            .world
            .unit_position(caster_unit)
            .unwrap_or(entity.position);
        let dir = (target_pos - from).normalize_or_zero();
        let dest = target_pos - dir * offset;

        ctx.world.set_unit_position(caster_unit, dest);
        entity.position = dest;
        ctx.publish(
            entity.id,
            EventKind::Teleported {
                unit: caster_unit,
                position: dest,
            },
        );
        ctx.publish(
            entity.id,
            EventKind::StrikeStep {
                target: unit,
                position: dest,
            },
        );
        super::apply_single_damage(ctx, entity, unit, amount);
        if let Some(follow_up) = ctx.def.follow_up {
            let yaw = math::bearing(dest, target_pos).unwrap_or(entity.yaw);
            ctx.follow_ups.push(FollowUp {
                ability: follow_up,
                caster: entity.caster,
                position: dest,
                yaw,
            });
        }
        state(entity).phase = StrikePhase::Attack {
            next_at: ctx.now + secs_to_ticks(interval),
        };
        return;
    }
}

fn pop_mark(entity: &mut AbilityEntity) -> Option<(UnitId, f32)> {
    let marks = &mut state(entity).marks;
    if marks.is_empty() {
        None
    } else {
        Some(marks.remove(0))
    }
}

/// List exhausted: curved casts return to the start position with one more
/// discrete teleport, then recovery.
fn finish_attack(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity, caster_unit: UnitId) {
    let params = ctx.def.strike.expect("strike entity without strike params");
    if entity.curve.abs() > params.return_curve {
        let start = state(entity).start_pos;
        ctx.world.set_unit_position(caster_unit, start);
        entity.position = start;
        ctx.publish(
            entity.id,
            EventKind::Teleported {
                unit: caster_unit,
                position: start,
            },
        );
    }
    state(entity).phase = StrikePhase::WindDown {
        until: ctx.now + secs_to_ticks(params.winddown),
    };
}
