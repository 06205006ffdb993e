//! Guidance math for thrown cards.
//!
//! Provides speed and aim classification, the cubic correction curve for
//! off-target throws, the late on-target correction, capture-zone braking
//! and the docking rotation. Everything here is pure; the flight system
//! owns the state.

use std::f64::consts::FRAC_PI_2;

use cardflight_core::components::{CorrectionCurve, FlightDescriptor};
use cardflight_core::constants::*;
use cardflight_core::enums::SpeedClass;
use cardflight_core::types::frame_factor;
use cardflight_core::DVec2;

/// Classify a release speed.
pub fn speed_class(speed: f64) -> SpeedClass {
    if speed < SPEED_CLASS_MEDIUM {
        SpeedClass::Slow
    } else if speed < SPEED_CLASS_FAST {
        SpeedClass::Medium
    } else {
        SpeedClass::Fast
    }
}

/// Largest aim offset that still counts as on-target. Faster throws need
/// tighter aim.
pub fn on_target_threshold(class: SpeedClass) -> f64 {
    let factor = match class {
        SpeedClass::Slow => ON_TARGET_FACTOR_SLOW,
        SpeedClass::Medium => ON_TARGET_FACTOR_MEDIUM,
        SpeedClass::Fast => ON_TARGET_FACTOR_FAST,
    };
    ON_TARGET_BASE_OFFSET * factor
}

/// Distance from `target` to the closest point on the ray from `position`
/// along `velocity`. A target behind the ray origin gives the full distance.
pub fn aim_offset(position: DVec2, velocity: DVec2, target: DVec2) -> f64 {
    let to_target = target - position;
    let Some(dir) = velocity.try_normalize() else {
        return to_target.length();
    };
    let along = to_target.dot(dir);
    if along < 0.0 {
        to_target.length()
    } else {
        (to_target - dir * along).length()
    }
}

/// Build the correction curve for an off-target throw.
///
/// The curve starts at the release point and ends at the target. Both
/// intermediate points are pushed sideways, toward the side the card was
/// thrown, by an amount proportional to the aim error.
pub fn build_correction_curve(
    start: DVec2,
    velocity: DVec2,
    target: DVec2,
    aim_offset: f64,
    budget_secs: f64,
) -> Option<CorrectionCurve> {
    let to_target = target - start;
    let dir = to_target.try_normalize()?;
    let side = if dir.perp_dot(velocity) < 0.0 { -1.0 } else { 1.0 };
    let bow = dir.perp() * side * aim_offset * CURVE_BOW_FACTOR;

    let speed = velocity.length().max(1.0);
    let max_duration = (budget_secs * CURVE_BUDGET_FRACTION).max(CURVE_MIN_DURATION);
    let duration_secs = (to_target.length() / speed).clamp(CURVE_MIN_DURATION, max_duration);

    Some(CorrectionCurve {
        start,
        control_a: start + to_target / 3.0 + bow,
        control_b: start + to_target * (2.0 / 3.0) + bow * 0.5,
        end: target,
        duration_secs,
    })
}

/// Point on the curve at parameter `t` in [0, 1].
pub fn bezier_point(curve: &CorrectionCurve, t: f64) -> DVec2 {
    let t = t.clamp(0.0, 1.0);
    let u = 1.0 - t;
    curve.start * (u * u * u)
        + curve.control_a * (3.0 * u * u * t)
        + curve.control_b * (3.0 * u * t * t)
        + curve.end * (t * t * t)
}

/// Fraction of a per-frame blend weight applied over `dt`.
pub fn blend_factor(per_frame_weight: f64, dt: f64) -> f64 {
    let w = per_frame_weight.clamp(0.0, 1.0);
    if w >= 1.0 {
        return if dt > 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - frame_factor(1.0 - w, dt)
}

/// Cubic smoothstep on [0, 1].
pub fn smoothstep(u: f64) -> f64 {
    let u = u.clamp(0.0, 1.0);
    u * u * (3.0 - 2.0 * u)
}

/// Limit the length of `v` to `max`, keeping its direction.
///
/// Safe when the length overflows even though every component is finite.
/// Non-finite vectors come back as zero.
pub fn clamp_speed(v: DVec2, max: f64) -> DVec2 {
    let speed = v.length();
    if speed <= max {
        return v;
    }
    if speed.is_finite() {
        return v * (max / speed);
    }
    let largest = v.abs().max_element();
    match (v / largest).try_normalize() {
        Some(dir) => dir * max,
        None => DVec2::ZERO,
    }
}

/// Steer an off-target card along its correction curve.
///
/// Blends the velocity toward a short lookahead on the curve with a weight
/// that grows as the curve progresses, then toward a direct pull once the
/// curve is nearly done.
pub fn follow_curve(
    curve: &CorrectionCurve,
    position: DVec2,
    velocity: DVec2,
    elapsed: f64,
    remaining: f64,
    dt: f64,
) -> DVec2 {
    let progress = (elapsed / curve.duration_secs).clamp(0.0, 1.0);
    let ahead = (progress + CURVE_LOOKAHEAD_SECS / curve.duration_secs).min(1.0);
    let desired = clamp_speed(
        (bezier_point(curve, ahead) - position) / CURVE_LOOKAHEAD_SECS,
        MAX_GUIDED_SPEED,
    );

    let weight = CURVE_MIN_WEIGHT + (1.0 - CURVE_MIN_WEIGHT) * progress;
    let mut v = velocity.lerp(desired, blend_factor(weight, dt));

    if progress > DIRECT_PULL_START {
        let to_target = curve.end - position;
        if let Some(dir) = to_target.try_normalize() {
            let time_left = (remaining - GUIDANCE_TIME_MARGIN).max(CURVE_LOOKAHEAD_SECS);
            let speed = v.length().max(to_target.length() / time_left);
            let direct = clamp_speed(dir * speed, MAX_GUIDED_SPEED);
            let pull = (progress - DIRECT_PULL_START) / (1.0 - DIRECT_PULL_START);
            v = v.lerp(direct, blend_factor(pull, dt));
        }
    }
    v
}

/// Late correction for an on-target card that would otherwise arrive after
/// the budget. `None` before guidance activates or while the card is on
/// schedule.
pub fn on_target_correction(
    descriptor: &FlightDescriptor,
    position: DVec2,
    velocity: DVec2,
    target: DVec2,
    budget_secs: f64,
    dt: f64,
) -> Option<DVec2> {
    let elapsed = descriptor.elapsed_secs;
    if elapsed < descriptor.guidance_activation_secs {
        return None;
    }
    let to_target = target - position;
    let distance = to_target.length();
    let dir = to_target.try_normalize()?;

    let remaining = budget_secs - elapsed;
    let time_left = (remaining - GUIDANCE_TIME_MARGIN).max(CURVE_LOOKAHEAD_SECS);
    let closing = velocity.dot(dir);
    let projected = if closing > 1.0 {
        distance / closing
    } else {
        f64::INFINITY
    };
    if projected <= time_left {
        return None;
    }

    let required = clamp_speed(dir * (distance / time_left), MAX_GUIDED_SPEED);
    let window = (budget_secs - GUIDANCE_TIME_MARGIN - descriptor.guidance_activation_secs)
        .max(CURVE_LOOKAHEAD_SECS);
    let ramp = ((elapsed - descriptor.guidance_activation_secs) / window).clamp(0.0, 1.0);
    let weight = CURVE_MIN_WEIGHT + (0.5 - CURVE_MIN_WEIGHT) * ramp * ramp;
    Some(velocity.lerp(required, blend_factor(weight, dt)))
}

/// Brake and attract a card inside the capture zone.
pub fn capture_zone(position: DVec2, velocity: DVec2, target: DVec2, dt: f64) -> DVec2 {
    let to_target = target - position;
    let distance = to_target.length();
    if distance >= CAPTURE_RADIUS {
        return velocity;
    }

    let mut v = velocity;
    let speed = v.length();
    if speed > CAPTURE_SPEED_CAP {
        let excess = speed - CAPTURE_SPEED_CAP;
        let braked = CAPTURE_SPEED_CAP + excess * frame_factor(CAPTURE_BRAKE_RETAIN, dt);
        v *= braked / speed;
    }

    if let Some(dir) = to_target.try_normalize() {
        let proximity = 1.0 - distance / CAPTURE_RADIUS;
        v += dir * (MAGNET_STRENGTH * proximity * dt);
    }
    v
}

/// Final rotation for a docked card.
///
/// A rotation within `UPRIGHT_TOLERANCE` of a right angle is kept. Anything
/// else settles on the next right angle in the direction of residual spin.
pub fn docking_rotation(rotation: f64, angular_velocity: f64) -> f64 {
    let quarters = rotation / FRAC_PI_2;
    let nearest = quarters.round() * FRAC_PI_2;
    if (rotation - nearest).abs() <= UPRIGHT_TOLERANCE {
        return rotation;
    }
    if angular_velocity >= 0.0 {
        quarters.ceil() * FRAC_PI_2
    } else {
        quarters.floor() * FRAC_PI_2
    }
}
