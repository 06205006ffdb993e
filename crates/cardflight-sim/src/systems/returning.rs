//! Returning system: cards that will not dock go back to their hand slot.

use std::f64::consts::TAU;

use hecs::{Entity, World};

use cardflight_core::components::*;
use cardflight_core::constants::*;
use cardflight_core::enums::{LifecycleState, ReturnReason};
use cardflight_core::types::{frame_factor, pivot_to_center, CardId};
use cardflight_core::DVec2;

use crate::systems::drag::move_towards;

/// Send a card home. Only Dragging, ValidatingThrow and Flying cards can
/// start returning; returns false for any other state.
pub fn begin(world: &mut World, entity: Entity, now: f64, reason: ReturnReason) -> bool {
    {
        let Ok((kin, grip, anchors, life)) = world
            .query_one_mut::<(&mut Kinematics, &Grip, &mut Anchors, &mut Lifecycle)>(entity)
        else {
            return false;
        };
        match life.state {
            LifecycleState::Dragging => {
                // Position is still the pivot; switch to the card center.
                kin.position =
                    pivot_to_center(kin.position, grip.pivot_offset, kin.rotation, kin.scale);
            }
            LifecycleState::ValidatingThrow | LifecycleState::Flying => {}
            _ => return false,
        }
        kin.velocity = DVec2::ZERO;
        anchors.target = Some(anchors.home);
        life.state = LifecycleState::Returning;
        life.entered_at = now;
    }
    let _ = world.remove_one::<Flight>(entity);
    let _ = world.insert_one(
        entity,
        Returning {
            started_at: now,
            reason,
        },
    );
    true
}

/// Blend returning cards toward home; completes those that arrived or timed
/// out. Returns the ids that completed, all unsuccessful.
pub fn run(world: &mut World, now: f64, dt: f64, timeout_secs: f64) -> Vec<(CardId, bool)> {
    let mut arrived: Vec<(Entity, CardId)> = Vec::new();
    let blend = 1.0 - (-RETURN_BLEND_RATE * dt).exp();

    for (entity, (tag, life, kin, returning, anchors)) in world.query_mut::<(
        &CardTag,
        &Lifecycle,
        &mut Kinematics,
        &Returning,
        &Anchors,
    )>() {
        if life.state != LifecycleState::Returning {
            continue;
        }
        let home = anchors.home;
        let next = kin.position.lerp(home, blend);
        kin.velocity = if dt > 0.0 {
            (next - kin.position) / dt
        } else {
            DVec2::ZERO
        };
        kin.position = next;

        kin.angular_velocity *= frame_factor(RETURN_ANGULAR_DAMPING, dt);
        kin.rotation += kin.angular_velocity * dt;
        let upright = (kin.rotation / TAU).round() * TAU;
        kin.rotation += (upright - kin.rotation) * blend;
        kin.scale = move_towards(kin.scale, REST_SCALE, LIFT_RATE * dt);

        let timed_out = now - returning.started_at >= timeout_secs;
        if kin.position.distance(home) < RETURN_ARRIVAL_DISTANCE || timed_out {
            if timed_out {
                log::debug!("{} return timed out ({})", tag.id, returning.reason);
            }
            kin.position = home;
            kin.velocity = DVec2::ZERO;
            kin.angular_velocity = 0.0;
            kin.rotation = upright;
            kin.scale = REST_SCALE;
            arrived.push((entity, tag.id.clone()));
        }
    }

    let mut completed = Vec::with_capacity(arrived.len());
    for (entity, id) in arrived {
        if let Ok(mut life) = world.get::<&mut Lifecycle>(entity) {
            life.state = LifecycleState::Completed;
            life.entered_at = now;
        }
        let _ = world.insert_one(entity, Completed { at: now, success: false });
        completed.push((id, false));
    }
    completed
}
