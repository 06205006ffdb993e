//! Cleanup system: removes completed cards once their grace period is over.

use hecs::{Entity, World};

use cardflight_core::components::{CardTag, Completed};

/// Despawn cards completed at least `grace_secs` ago and return their tags
/// so the caller can release the visual proxies.
/// Uses a pre-allocated buffer to avoid per-frame allocation.
pub fn run(
    world: &mut World,
    now: f64,
    grace_secs: f64,
    despawn_buffer: &mut Vec<Entity>,
) -> Vec<CardTag> {
    despawn_buffer.clear();

    for (entity, completed) in world.query_mut::<&Completed>() {
        if now - completed.at >= grace_secs {
            despawn_buffer.push(entity);
        }
    }

    let mut removed = Vec::with_capacity(despawn_buffer.len());
    for entity in despawn_buffer.drain(..) {
        if let Ok(tag) = world.remove_one::<CardTag>(entity) {
            removed.push(tag);
        }
        let _ = world.despawn(entity);
    }
    removed
}
