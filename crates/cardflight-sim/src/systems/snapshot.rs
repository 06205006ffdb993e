//! Snapshot system: publishes transforms and builds the frame snapshot.
//!
//! Read-only with respect to the world.

use hecs::{Entity, World};

use cardflight_core::components::*;
use cardflight_core::enums::LifecycleState;
use cardflight_core::events::EngineEvent;
use cardflight_core::state::{CardView, FrameSnapshot};
use cardflight_core::types::{pivot_to_center, CardTransform, FrameTime};

use crate::sink::{TraceSink, TransformSink};

/// Presentation transform of one card.
///
/// While dragging the stored position is the pivot, so the center is found
/// by rotating the scaled pivot offset back. Otherwise it is the center.
pub fn card_transform(kin: &Kinematics, grip: &Grip, state: LifecycleState) -> CardTransform {
    let position = match state {
        LifecycleState::Dragging => {
            pivot_to_center(kin.position, grip.pivot_offset, kin.rotation, kin.scale)
        }
        _ => kin.position,
    };
    CardTransform {
        position,
        rotation: kin.rotation,
        scale: kin.scale,
    }
}

/// Send every card's transform to the sink, and its position to the trace.
pub fn publish(
    world: &World,
    sink: &mut dyn TransformSink,
    mut trace: Option<&mut dyn TraceSink>,
    frame: u64,
) {
    let mut query = world.query::<(&CardTag, &Kinematics, &Grip, &Lifecycle)>();
    for (_entity, (tag, kin, grip, life)) in query.iter() {
        let transform = card_transform(kin, grip, life.state);
        sink.apply(tag.visual, &transform);
        if let Some(trace) = trace.as_deref_mut() {
            trace.record_point(&tag.id, frame, transform.position);
        }
    }
}

/// View of a single card.
pub fn card_view(world: &World, entity: Entity) -> Option<CardView> {
    let mut query = world
        .query_one::<(
            &CardTag,
            &Kinematics,
            &Grip,
            &Lifecycle,
            &Anchors,
            Option<&Flight>,
        )>(entity)
        .ok()?;
    let (tag, kin, grip, life, anchors, flight) = query.get()?;
    Some(build_view(tag, kin, grip, life, anchors, flight))
}

fn build_view(
    tag: &CardTag,
    kin: &Kinematics,
    grip: &Grip,
    life: &Lifecycle,
    anchors: &Anchors,
    flight: Option<&Flight>,
) -> CardView {
    CardView {
        id: tag.id.clone(),
        lifecycle: life.state,
        state_entered_at: life.entered_at,
        transform: card_transform(kin, grip, life.state),
        position: kin.position,
        velocity: kin.velocity,
        angular_velocity: kin.angular_velocity,
        pivot_offset: grip.pivot_offset,
        target_anchor: anchors.target,
        home_anchor: anchors.home,
        slot: anchors.slot,
        release_speed: flight.map(|f| f.release_speed),
        flight: flight.map(|f| f.descriptor),
    }
}

/// Build a complete snapshot of the world.
pub fn build_snapshot(
    world: &World,
    time: FrameTime,
    running: bool,
    events: Vec<EngineEvent>,
) -> FrameSnapshot {
    let mut cards: Vec<CardView> = world
        .query::<(
            &CardTag,
            &Kinematics,
            &Grip,
            &Lifecycle,
            &Anchors,
            Option<&Flight>,
        )>()
        .iter()
        .map(|(_, (tag, kin, grip, life, anchors, flight))| {
            build_view(tag, kin, grip, life, anchors, flight)
        })
        .collect();
    cards.sort_by(|a, b| a.id.cmp(&b.id));

    FrameSnapshot {
        time,
        running,
        cards,
        events,
    }
}
