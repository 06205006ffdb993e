//! Release classification: is this release a throw, and of what kind?

use cardflight_core::components::FlightDescriptor;
use cardflight_core::constants::*;
use cardflight_core::enums::{DeviceClass, SpeedClass, ThrowRejection};
use cardflight_core::types::{is_valid_point, Viewport};
use cardflight_core::DVec2;

use crate::guidance;

/// Everything known about a release at the moment it happens.
#[derive(Debug, Clone, Copy)]
pub struct ThrowInput {
    /// Card center at release.
    pub position: DVec2,
    pub velocity: DVec2,
    pub target: Option<DVec2>,
    /// Largest aim offset accepted for a long throw.
    pub aim_allowance: f64,
    pub docking_budget_secs: f64,
}

/// Aim allowance for the current viewport and device.
pub fn aim_allowance(viewport: Viewport, device: DeviceClass) -> f64 {
    let fraction = match device {
        DeviceClass::Mobile => AIM_ALLOWANCE_MOBILE,
        DeviceClass::Tablet => AIM_ALLOWANCE_TABLET,
        DeviceClass::Desktop => AIM_ALLOWANCE_DESKTOP,
    };
    viewport.min_dimension() * fraction
}

/// Whether the release looks deliberate rather than a card let go.
pub fn is_throw_intent(speed: f64, drag_secs: f64) -> bool {
    speed > INTENT_FAST_SPEED
        || (speed > INTENT_DELIBERATE_SPEED && drag_secs > INTENT_DELIBERATE_DRAG_SECS)
}

/// Angle of `velocity` in degrees, screen-down convention (90 = straight down).
pub fn release_angle_deg(velocity: DVec2) -> f64 {
    velocity.y.atan2(velocity.x).to_degrees()
}

/// Validate a release and describe the flight it starts.
///
/// Checks run in a fixed order: target, finiteness, slow drop, downward arc,
/// long-throw speed, aim offset.
pub fn validate(input: &ThrowInput) -> Result<FlightDescriptor, ThrowRejection> {
    let target = input.target.ok_or(ThrowRejection::MissingTarget)?;
    if !is_valid_point(target) {
        return Err(ThrowRejection::MalformedTarget);
    }
    if !input.position.is_finite() || !input.velocity.is_finite() {
        return Err(ThrowRejection::NonFiniteRelease);
    }

    let speed = input.velocity.length();
    let distance = input.position.distance(target);

    // Below directional speed the release is a drop: no direction to judge.
    if speed < MIN_DIRECTIONAL_SPEED {
        if distance > LONG_THROW_DISTANCE {
            return Err(ThrowRejection::TooSlow { distance, speed });
        }
        return Ok(FlightDescriptor {
            speed_class: SpeedClass::Slow,
            aim_offset: 0.0,
            on_target: true,
            guidance_activation_secs: 0.0,
            correction_curve: None,
            elapsed_secs: 0.0,
        });
    }

    let angle_deg = release_angle_deg(input.velocity);
    if (DOWNWARD_ARC_MIN_DEG..=DOWNWARD_ARC_MAX_DEG).contains(&angle_deg) {
        return Err(ThrowRejection::DownwardArc { angle_deg });
    }

    if distance > LONG_THROW_DISTANCE && speed < MIN_THROW_SPEED {
        return Err(ThrowRejection::TooSlow { distance, speed });
    }

    let aim_offset = guidance::aim_offset(input.position, input.velocity, target);
    if aim_offset > input.aim_allowance {
        return Err(ThrowRejection::AimOffset {
            offset: aim_offset,
            allowance: input.aim_allowance,
        });
    }

    let speed_class = guidance::speed_class(speed);
    let on_target = aim_offset <= guidance::on_target_threshold(speed_class);
    let correction_curve = if on_target {
        None
    } else {
        guidance::build_correction_curve(
            input.position,
            input.velocity,
            target,
            aim_offset,
            input.docking_budget_secs,
        )
    };
    let guidance_activation_secs = if on_target {
        input.docking_budget_secs * ON_TARGET_GUIDANCE_FRACTION
    } else {
        0.0
    };

    Ok(FlightDescriptor {
        speed_class,
        aim_offset,
        on_target,
        guidance_activation_secs,
        correction_curve,
        elapsed_secs: 0.0,
    })
}
