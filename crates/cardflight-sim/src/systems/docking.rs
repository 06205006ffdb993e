//! Docking system: a captured card settles on its target, then completes.

use hecs::{Entity, World};

use cardflight_core::components::*;
use cardflight_core::constants::REST_SCALE;
use cardflight_core::enums::LifecycleState;
use cardflight_core::types::CardId;
use cardflight_core::DVec2;

use crate::guidance;

/// Move a captured card from Flying to Docking at time `at`.
pub fn begin(world: &mut World, entity: Entity, at: f64) {
    if world.remove_one::<Flight>(entity).is_err() {
        return;
    }
    let Ok((kin, anchors, life)) =
        world.query_one_mut::<(&mut Kinematics, &Anchors, &mut Lifecycle)>(entity)
    else {
        return;
    };

    let target = anchors.target.unwrap_or(anchors.home);
    let docking = Docking {
        started_at: at,
        start_rotation: kin.rotation,
        target_rotation: guidance::docking_rotation(kin.rotation, kin.angular_velocity),
        start_scale: kin.scale,
    };
    kin.position = target;
    kin.velocity = DVec2::ZERO;
    life.state = LifecycleState::Docking;
    life.entered_at = at;

    let _ = world.insert_one(entity, docking);
}

/// Ease rotation and scale of docking cards; completes those that settled.
/// Returns the ids that completed, all successful.
pub fn run(world: &mut World, now: f64, settle_secs: f64) -> Vec<(CardId, bool)> {
    let mut settled: Vec<(Entity, CardId)> = Vec::new();

    for (entity, (tag, life, kin, docking, anchors)) in world.query_mut::<(
        &CardTag,
        &Lifecycle,
        &mut Kinematics,
        &Docking,
        &Anchors,
    )>() {
        if life.state != LifecycleState::Docking {
            continue;
        }
        let u = if settle_secs > 0.0 {
            ((now - docking.started_at) / settle_secs).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let eased = guidance::smoothstep(u);

        kin.position = anchors.target.unwrap_or(anchors.home);
        kin.velocity = DVec2::ZERO;
        kin.angular_velocity = 0.0;
        kin.rotation =
            docking.start_rotation + (docking.target_rotation - docking.start_rotation) * eased;
        kin.scale = docking.start_scale + (REST_SCALE - docking.start_scale) * eased;

        if u >= 1.0 {
            settled.push((entity, tag.id.clone()));
        }
    }

    let mut completed = Vec::with_capacity(settled.len());
    for (entity, id) in settled {
        if let Ok(mut life) = world.get::<&mut Lifecycle>(entity) {
            life.state = LifecycleState::Completed;
            life.entered_at = now;
        }
        let _ = world.insert_one(entity, Completed { at: now, success: true });
        completed.push((id, true));
    }
    completed
}
