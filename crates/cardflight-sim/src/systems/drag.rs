//! Drag pendulum: the card hangs from the input point and swings.

use std::f64::consts::PI;

use hecs::World;

use cardflight_core::components::{Grip, Kinematics, Lifecycle};
use cardflight_core::constants::*;
use cardflight_core::enums::LifecycleState;
use cardflight_core::types::{frame_factor, shortest_angle};
use cardflight_core::DVec2;

use crate::guidance::clamp_speed;

/// Rotation at which the center of mass hangs straight below the pivot.
pub fn equilibrium_angle(pivot_offset: DVec2, center_of_mass: DVec2) -> f64 {
    let pivot_from_com = pivot_offset - center_of_mass;
    pivot_from_com.x.atan2(pivot_from_com.y) + PI
}

/// Advance every dragged card by `dt` seconds.
pub fn run(world: &mut World, dt: f64) {
    for (_entity, (life, grip, kin)) in
        world.query_mut::<(&Lifecycle, &mut Grip, &mut Kinematics)>()
    {
        if life.state != LifecycleState::Dragging {
            continue;
        }
        step(grip, kin, dt);
    }
}

/// One pendulum step for a single card.
pub fn step(grip: &mut Grip, kin: &mut Kinematics, dt: f64) {
    let input = grip.input_point;
    let moved = grip.last_tick_input.map_or(DVec2::ZERO, |last| input - last);
    let moving = moved.length() > FINGER_MOVE_EPSILON;

    let pivot_from_com = grip.pivot_offset - grip.center_of_mass;
    let angle_diff = shortest_angle(
        kin.rotation,
        equilibrium_angle(grip.pivot_offset, grip.center_of_mass),
    );

    let gravity_strength = if moving {
        DRAG_GRAVITY_STRENGTH * DRAG_MOVING_GRAVITY_FACTOR
    } else {
        DRAG_GRAVITY_STRENGTH
    };
    let gravity_torque = angle_diff.sin() * gravity_strength;

    let input_velocity = if dt > 0.0 {
        clamp_speed(moved / dt, MAX_RELEASE_SPEED)
    } else {
        DVec2::ZERO
    };
    let finger_torque = if moving && dt > 0.0 {
        let torque = pivot_from_com.perp_dot(input_velocity) * FINGER_TORQUE_INFLUENCE;
        if torque.is_finite() {
            torque
        } else {
            0.0
        }
    } else {
        0.0
    };

    let damping = if moving {
        DRAG_DAMPING_MOVING
    } else if angle_diff.abs() < DRAG_SETTLE_ANGLE {
        DRAG_DAMPING_SETTLING
    } else {
        DRAG_DAMPING_SWINGING
    };

    let mut angular = kin.angular_velocity + (gravity_torque + finger_torque) * dt;
    angular *= frame_factor(damping, dt);
    kin.angular_velocity = angular.clamp(-MAX_ANGULAR_VELOCITY, MAX_ANGULAR_VELOCITY);
    kin.rotation += kin.angular_velocity * dt;

    kin.position = input;
    kin.velocity = if input_velocity.is_finite() {
        input_velocity
    } else {
        DVec2::ZERO
    };
    kin.scale = move_towards(kin.scale, LIFTED_SCALE, LIFT_RATE * dt);
    grip.last_tick_input = Some(input);
}

/// Move `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: f64, target: f64, max_delta: f64) -> f64 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}
