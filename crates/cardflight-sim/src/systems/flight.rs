//! Flight system: guided flight toward the drop target.
//!
//! Per-frame precedence for a flying card:
//! 1. capture check,
//! 2. budget exhaustion, which starts the force dock,
//! 3. guidance and integration,
//! 4. capture check on the new position.

use hecs::{Entity, World};

use cardflight_core::components::{Anchors, CardTag, Flight, ForceDock, Kinematics, Lifecycle};
use cardflight_core::constants::*;
use cardflight_core::enums::LifecycleState;
use cardflight_core::events::EngineEvent;
use cardflight_core::types::{frame_factor, Viewport};
use cardflight_core::DVec2;

use crate::guidance;
use crate::systems::docking;

/// Inputs shared by every flying card this frame.
#[derive(Debug, Clone, Copy)]
pub struct FlightContext {
    pub now: f64,
    pub dt: f64,
    pub viewport: Viewport,
    pub docking_budget_secs: f64,
    pub force_dock_secs: f64,
}

/// What happened to one card this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlightStep {
    /// Distance to target when the force dock engaged.
    pub force_dock_started: Option<f64>,
    /// Capture time, when the card reached the target.
    pub captured_at: Option<f64>,
}

/// Advance every flying card; captured cards move on to Docking.
pub fn run(world: &mut World, ctx: &FlightContext, events: &mut Vec<EngineEvent>) {
    let mut captures: Vec<(Entity, f64)> = Vec::new();

    for (entity, (tag, life, kin, flight, anchors)) in world.query_mut::<(
        &CardTag,
        &Lifecycle,
        &mut Kinematics,
        &mut Flight,
        &Anchors,
    )>() {
        if life.state != LifecycleState::Flying {
            continue;
        }
        let target = anchors.target.unwrap_or(anchors.home);
        let report = step(kin, flight, target, ctx);

        if let Some(distance) = report.force_dock_started {
            log::info!("{} ran out of docking budget {distance:.0} px from target", tag.id);
            events.push(EngineEvent::ForceDockStarted {
                card: tag.id.clone(),
                distance,
            });
        }
        if let Some(at) = report.captured_at {
            let flight_secs = at - flight.released_at;
            log::debug!("{} captured after {flight_secs:.3}s", tag.id);
            events.push(EngineEvent::Captured {
                card: tag.id.clone(),
                flight_secs,
            });
            captures.push((entity, at));
        }
    }

    for (entity, at) in captures {
        docking::begin(world, entity, at);
    }
}

/// One flight step for a single card.
pub fn step(kin: &mut Kinematics, flight: &mut Flight, target: DVec2, ctx: &FlightContext) -> FlightStep {
    let mut report = FlightStep::default();
    let elapsed = (ctx.now - flight.released_at).max(0.0);
    flight.descriptor.elapsed_secs = elapsed;

    if flight.force_dock.is_none() {
        // 1. Capture
        if is_captured(kin.position, kin.velocity, target) {
            report.captured_at = Some(ctx.now);
            return report;
        }
        // 2. Budget exhaustion
        if elapsed >= ctx.docking_budget_secs {
            report.force_dock_started = Some(kin.position.distance(target));
            flight.force_dock = Some(ForceDock {
                started_at: flight.released_at + ctx.docking_budget_secs,
                from: kin.position,
            });
        }
    }

    if let Some(force) = flight.force_dock {
        report.captured_at = force_dock_step(kin, &force, target, ctx);
        return report;
    }

    // 3. Guidance and integration
    let remaining = ctx.docking_budget_secs - elapsed;
    let mut velocity = match (&flight.descriptor.correction_curve, flight.descriptor.on_target) {
        (Some(curve), false) => {
            guidance::follow_curve(curve, kin.position, kin.velocity, elapsed, remaining, ctx.dt)
        }
        _ => guidance::on_target_correction(
            &flight.descriptor,
            kin.position,
            kin.velocity,
            target,
            ctx.docking_budget_secs,
            ctx.dt,
        )
        .unwrap_or_else(|| kin.velocity * frame_factor(FLIGHT_DRAG, ctx.dt)),
    };
    velocity = guidance::capture_zone(kin.position, velocity, target, ctx.dt);

    let (position, velocity, swept) = integrate(kin.position, velocity, target, ctx);
    kin.position = position;
    kin.velocity = velocity;

    let final_zone = kin.position.distance(target) < FINAL_DOCK_ZONE;
    damp_spin(kin, final_zone, ctx.dt);

    // 4. Capture on the new position
    if swept || is_captured(kin.position, kin.velocity, target) {
        report.captured_at = Some(ctx.now);
    }
    report
}

/// Close and slow enough to dock.
pub fn is_captured(position: DVec2, velocity: DVec2, target: DVec2) -> bool {
    position.distance(target) <= DOCK_CAPTURE_DISTANCE && velocity.length() <= DOCK_CAPTURE_SPEED
}

/// Apply one frame of displacement.
///
/// The step is rescaled to at most a quarter of the viewport diagonal, cut
/// short at the closest approach when it passes through the capture
/// distance, and kept inside the viewport plus the containment margin.
/// Returns the new position, velocity and whether the card swept through
/// the target.
fn integrate(position: DVec2, velocity: DVec2, target: DVec2, ctx: &FlightContext) -> (DVec2, DVec2, bool) {
    let mut displacement = velocity * ctx.dt;
    let max_step = ctx.viewport.diagonal() * MAX_STEP_FRACTION;
    let length = displacement.length();
    if length > max_step {
        displacement *= max_step / length;
    }

    let mut swept = false;
    let step_sq = displacement.length_squared();
    if step_sq > 0.0 {
        let s = ((target - position).dot(displacement) / step_sq).clamp(0.0, 1.0);
        let closest = position + displacement * s;
        if s > 0.0 && s < 1.0 && closest.distance(target) <= DOCK_CAPTURE_DISTANCE {
            displacement *= s;
            swept = true;
        }
    }

    let min = DVec2::splat(-CONTAINMENT_MARGIN);
    let max = DVec2::new(ctx.viewport.width, ctx.viewport.height) + CONTAINMENT_MARGIN;
    let proposed = position + displacement;
    let contained = proposed.clamp(min, max);

    // Outward motion is dropped on a clamped axis.
    let mut velocity = velocity;
    if (proposed.x > max.x && velocity.x > 0.0) || (proposed.x < min.x && velocity.x < 0.0) {
        velocity.x = 0.0;
    }
    if (proposed.y > max.y && velocity.y > 0.0) || (proposed.y < min.y && velocity.y < 0.0) {
        velocity.y = 0.0;
    }
    (contained, velocity, swept)
}

/// Eased direct interpolation to the target. Returns the capture time once
/// the interpolation is done.
fn force_dock_step(kin: &mut Kinematics, force: &ForceDock, target: DVec2, ctx: &FlightContext) -> Option<f64> {
    let u = if ctx.force_dock_secs > 0.0 {
        ((ctx.now - force.started_at) / ctx.force_dock_secs).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let next = force.from.lerp(target, guidance::smoothstep(u));
    kin.velocity = if ctx.dt > 0.0 {
        (next - kin.position) / ctx.dt
    } else {
        DVec2::ZERO
    };
    kin.position = next;
    damp_spin(kin, true, ctx.dt);

    (u >= 1.0).then_some(force.started_at + ctx.force_dock_secs)
}

fn damp_spin(kin: &mut Kinematics, final_zone: bool, dt: f64) {
    let (damping, cap) = if final_zone {
        (FINAL_ZONE_ANGULAR_DAMPING, FINAL_ZONE_MAX_SPIN)
    } else {
        (FLIGHT_ANGULAR_DAMPING, MAX_ANGULAR_VELOCITY)
    };
    kin.angular_velocity = (kin.angular_velocity * frame_factor(damping, dt)).clamp(-cap, cap);
    kin.rotation += kin.angular_velocity * dt;
}
