//! Card physics engine: the per-frame integrator behind grab, drag and release.
//!
//! `CardPhysicsEngine` owns the entity registry, the velocity tracker and the
//! frame clock, runs all systems on `tick`, and produces `FrameSnapshot`s.
//! Time is injected by the caller, which keeps every run deterministic.

use std::collections::HashMap;

use hecs::Entity;

use cardflight_core::components::*;
use cardflight_core::config::EngineConfig;
use cardflight_core::constants::REST_SCALE;
use cardflight_core::enums::{DeviceClass, LifecycleState, ReturnReason, ThrowRejection};
use cardflight_core::error::EngineError;
use cardflight_core::events::EngineEvent;
use cardflight_core::state::{CardView, FrameSnapshot};
use cardflight_core::types::*;
use cardflight_core::DVec2;
use cardflight_layout::LayoutResult;

use crate::personality;
use crate::registry::{CardBundle, LayoutContext, Registry};
use crate::scheduler::FrameClock;
use crate::sink::{TraceSink, TransformSink};
use crate::systems;
use crate::systems::flight::FlightContext;
use crate::throw::{self, ThrowInput};
use crate::velocity::VelocityTracker;

type CompletionHook = Box<dyn FnOnce(bool)>;

/// Result of `release`.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseOutcome {
    /// Accepted; the card is flying.
    Thrown(FlightDescriptor),
    /// Refused; the card is returning and will complete with `false`.
    Rejected(ThrowRejection),
    /// No such card. The callback already fired with `false`.
    NotTracked,
    /// The card was not being dragged. The callback already fired with `false`.
    NotDragging,
}

/// The physics engine. Owns the ECS world and all per-card state.
pub struct CardPhysicsEngine {
    config: EngineConfig,
    viewport: Viewport,
    device_class: DeviceClass,
    registry: Registry,
    hooks: HashMap<CardId, CompletionHook>,
    tracker: VelocityTracker,
    /// Card whose gesture feeds the tracker.
    tracker_owner: Option<CardId>,
    clock: FrameClock,
    latest_time: f64,
    sink: Box<dyn TransformSink>,
    trace: Option<Box<dyn TraceSink>>,
    events: Vec<EngineEvent>,
    despawn_buffer: Vec<Entity>,
}

impl CardPhysicsEngine {
    /// Create an engine publishing to `sink`.
    pub fn new(config: EngineConfig, sink: impl TransformSink + 'static) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            viewport: config.viewport,
            device_class: config.device_class,
            registry: Registry::new(),
            hooks: HashMap::new(),
            tracker: VelocityTracker::new(),
            tracker_owner: None,
            clock: FrameClock::new(config.max_frame_dt),
            latest_time: 0.0,
            sink: Box::new(sink),
            trace: None,
            events: Vec::new(),
            despawn_buffer: Vec::new(),
            config,
        })
    }

    /// Attach a passive trace sink.
    pub fn with_trace(mut self, trace: Box<dyn TraceSink>) -> Self {
        self.trace = Some(trace);
        self
    }

    // --- Boundary operations ---

    /// Start tracking a card under the input point.
    ///
    /// Fails without leaving any state behind when an input is malformed, the
    /// card is already active, or the visual proxy belongs to another card.
    /// Any intentionally thrown card still in flight is sent home first.
    pub fn grab(
        &mut self,
        id: CardId,
        input: InputSample,
        visual: VisualHandle,
        center_hint: DVec2,
        layout: Option<&LayoutContext>,
    ) -> Result<(), EngineError> {
        check_sample(&input)?;
        if !is_valid_point(center_hint) {
            return Err(reject_input("center_hint", "not a finite point in range"));
        }
        if visual.is_null() {
            return Err(reject_input("visual", "null handle"));
        }

        let stale = match self.registry.lifecycle(&id) {
            Some(LifecycleState::Completed) => true,
            Some(_) => {
                log::warn!("grab of {id} refused: already active");
                return Err(EngineError::AlreadyTracked(id));
            }
            None => false,
        };
        if let Some(owner) = self.registry.visual_owner(visual) {
            if owner != id {
                log::warn!("grab of {id} refused: {visual} is owned by {owner}");
                return Err(EngineError::VisualInUse(visual));
            }
        }

        if stale {
            self.remove_card(&id);
        }
        self.observe(input.timestamp);
        let now = self.latest_time;

        self.force_return_thrown(now);

        let (card_size, home, slot) = match layout {
            Some(ctx) => match ctx.layout.slot_center(ctx.slot, ctx.container) {
                Some(center) => (ctx.layout.card_size(), center, Some(ctx.slot)),
                None => {
                    log::warn!(
                        "{id}: slot {} outside a layout of {} cards, homing on the grab center",
                        ctx.slot,
                        ctx.layout.card_count
                    );
                    (ctx.layout.card_size(), center_hint, None)
                }
            },
            None => (self.config.default_card_size, center_hint, None),
        };

        let pivot_offset = input.point - center_hint;
        let grip = Grip {
            pivot_offset,
            center_of_mass: personality::center_of_mass(&id, card_size, self.config.seed),
            input_point: input.point,
            last_tick_input: Some(input.point),
            grabbed_at: now,
        };
        let kinematics = Kinematics {
            position: input.point,
            velocity: DVec2::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            scale: REST_SCALE,
        };
        let transform = systems::snapshot::card_transform(&kinematics, &grip, LifecycleState::Dragging);

        self.registry.spawn(CardBundle {
            tag: CardTag {
                id: id.clone(),
                visual,
            },
            kinematics,
            grip,
            lifecycle: Lifecycle {
                state: LifecycleState::Dragging,
                entered_at: now,
            },
            anchors: Anchors {
                target: None,
                home,
                slot,
            },
        });
        self.sink.apply(visual, &transform);

        self.tracker.clear();
        self.tracker.add_sample(InputSample {
            point: input.point,
            timestamp: now,
        });
        self.tracker_owner = Some(id.clone());
        self.clock.start(now);

        log::debug!("grabbed {id} with pivot offset ({:.1}, {:.1})", pivot_offset.x, pivot_offset.y);
        self.emit(EngineEvent::Grabbed {
            card: id,
            pivot_offset,
        });
        Ok(())
    }

    /// Move the pivot of a dragged card. Unknown or non-dragging cards are
    /// ignored.
    pub fn drag(&mut self, id: &CardId, input: InputSample) -> Result<(), EngineError> {
        check_sample(&input)?;
        let Some(entity) = self.registry.entity(id) else {
            log::warn!("drag of unknown card {id} ignored");
            return Ok(());
        };
        self.observe(input.timestamp);

        let world = self.registry.world_mut();
        let Ok((life, grip, kin)) =
            world.query_one_mut::<(&Lifecycle, &mut Grip, &mut Kinematics)>(entity)
        else {
            return Ok(());
        };
        if life.state != LifecycleState::Dragging {
            log::trace!("drag of {id} ignored in {:?}", life.state);
            return Ok(());
        }
        grip.input_point = input.point;
        kin.position = input.point;

        if self.tracker_owner.as_ref() == Some(id) {
            self.tracker.add_sample(input);
        }
        Ok(())
    }

    /// Let go of a card.
    ///
    /// `on_complete` fires exactly once: with `true` when the card docks at
    /// `target`, with `false` when it returns home, or immediately with
    /// `false` when the card is not being dragged.
    pub fn release(
        &mut self,
        id: &CardId,
        target: Option<DVec2>,
        on_complete: impl FnOnce(bool) + 'static,
    ) -> ReleaseOutcome {
        let Some(entity) = self.registry.entity(id) else {
            log::warn!("release of unknown card {id}");
            on_complete(false);
            return ReleaseOutcome::NotTracked;
        };
        if self.registry.lifecycle(id) != Some(LifecycleState::Dragging) {
            log::debug!("release of {id} ignored: not dragging");
            on_complete(false);
            return ReleaseOutcome::NotDragging;
        }

        let now = self.latest_time;
        let velocity = if self.tracker_owner.as_ref() == Some(id) {
            self.tracker_owner = None;
            let v = self.tracker.estimate_velocity();
            self.tracker.clear();
            v
        } else {
            DVec2::ZERO
        };

        let world = self.registry.world_mut();
        let Ok((kin, grip, life)) =
            world.query_one_mut::<(&mut Kinematics, &Grip, &mut Lifecycle)>(entity)
        else {
            on_complete(false);
            return ReleaseOutcome::NotTracked;
        };
        let center = pivot_to_center(kin.position, grip.pivot_offset, kin.rotation, kin.scale);
        kin.position = center;
        kin.velocity = velocity;
        life.state = LifecycleState::ValidatingThrow;
        life.entered_at = now;
        let drag_secs = now - grip.grabbed_at;
        log::debug!("{id} released at ({:.1}, {:.1})", center.x, center.y);

        self.hooks.insert(id.clone(), Box::new(on_complete));

        let speed = velocity.length();
        let input = ThrowInput {
            position: center,
            velocity,
            target,
            aim_allowance: throw::aim_allowance(self.viewport, self.device_class),
            docking_budget_secs: self.config.docking_budget_secs,
        };

        match throw::validate(&input) {
            Ok(descriptor) => {
                let throw_intent = throw::is_throw_intent(speed, drag_secs);
                let world = self.registry.world_mut();
                if let Ok((life, anchors)) =
                    world.query_one_mut::<(&mut Lifecycle, &mut Anchors)>(entity)
                {
                    life.state = LifecycleState::Flying;
                    life.entered_at = now;
                    anchors.target = target;
                }
                let _ = world.insert_one(
                    entity,
                    Flight {
                        descriptor,
                        released_at: now,
                        release_speed: speed,
                        throw_intent,
                        force_dock: None,
                    },
                );
                log::debug!(
                    "{id} thrown: {:?} at {speed:.0} px/s, aim offset {:.0} px, on target: {}",
                    descriptor.speed_class,
                    descriptor.aim_offset,
                    descriptor.on_target
                );
                self.emit(EngineEvent::ThrowAccepted {
                    card: id.clone(),
                    speed_class: descriptor.speed_class,
                    on_target: descriptor.on_target,
                    aim_offset: descriptor.aim_offset,
                    throw_intent,
                });
                ReleaseOutcome::Thrown(descriptor)
            }
            Err(rejection) => {
                log::info!("{id} throw rejected: {rejection}");
                self.emit(EngineEvent::ThrowRejected {
                    card: id.clone(),
                    reason: rejection.to_string(),
                });
                self.begin_return(entity, id, now, ReturnReason::InvalidThrow { rejection });
                ReleaseOutcome::Rejected(rejection)
            }
        }
    }

    /// Re-anchor active cards after the hand or viewport changed.
    ///
    /// `ordered_ids[i]` sits in slot `i` of `layout`. Home anchors move;
    /// returning cards follow; a flying card keeps its drop target.
    pub fn update_all_active_positions(
        &mut self,
        ordered_ids: &[CardId],
        layout: &LayoutResult,
        container: ContainerFrame,
    ) {
        for (slot, id) in ordered_ids.iter().enumerate() {
            let Some(entity) = self.registry.entity(id) else {
                continue;
            };
            let Some(center) = layout.slot_center(slot, container) else {
                log::warn!(
                    "{id}: no slot {slot} in a layout of {} cards",
                    layout.card_count
                );
                continue;
            };
            let world = self.registry.world_mut();
            if let Ok((life, anchors)) = world.query_one_mut::<(&Lifecycle, &mut Anchors)>(entity) {
                anchors.home = center;
                anchors.slot = Some(slot);
                if life.state == LifecycleState::Returning {
                    anchors.target = Some(center);
                }
            }
        }
    }

    /// Remove a card now. A pending callback fires with `false`. Unknown ids
    /// are ignored.
    pub fn cleanup(&mut self, id: &CardId) {
        if !self.registry.contains(id) {
            log::debug!("cleanup of unknown card {id} ignored");
            return;
        }
        if self.tracker_owner.as_ref() == Some(id) {
            self.tracker_owner = None;
            self.tracker.clear();
        }
        if let Some(hook) = self.hooks.remove(id) {
            hook(false);
            self.emit(EngineEvent::Completed {
                card: id.clone(),
                success: false,
            });
        }
        self.remove_card(id);
        if self.registry.is_empty() {
            self.clock.stop();
        }
    }

    /// Remove every card now.
    pub fn cancel_all(&mut self) {
        for id in self.registry.ids() {
            self.cleanup(&id);
        }
    }

    /// Send every dragged or flying card home. Returns how many were sent.
    pub fn emergency_return_all(&mut self) -> usize {
        let now = self.latest_time;
        self.tracker_owner = None;
        self.tracker.clear();
        let mut count = 0;
        for id in self.registry.ids() {
            if let Some(entity) = self.registry.entity(&id) {
                if self.begin_return(entity, &id, now, ReturnReason::EmergencyReset) {
                    count += 1;
                }
            }
        }
        if count > 0 {
            log::info!("emergency return of {count} cards");
        }
        count
    }

    /// Send one dragged or flying card home.
    pub fn cancel(&mut self, id: &CardId) -> bool {
        let Some(entity) = self.registry.entity(id) else {
            return false;
        };
        if self.tracker_owner.as_ref() == Some(id) {
            self.tracker_owner = None;
            self.tracker.clear();
        }
        let now = self.latest_time;
        self.begin_return(entity, id, now, ReturnReason::Cancelled)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<(), EngineError> {
        if !viewport.is_valid() {
            return Err(reject_input("viewport", "dimensions must be positive"));
        }
        self.viewport = viewport;
        Ok(())
    }

    pub fn set_device_class(&mut self, device_class: DeviceClass) {
        self.device_class = device_class;
    }

    // --- Frame loop ---

    /// Advance all cards to `now` and return the resulting snapshot.
    pub fn tick(&mut self, now: f64) -> FrameSnapshot {
        if now.is_finite() {
            self.observe(now);
        } else {
            log::warn!("non-finite frame time ignored");
        }
        let time = self.clock.advance(self.latest_time);

        if self.clock.is_running() {
            self.run_systems(time);
            if self.registry.is_empty() {
                self.clock.stop();
            }
        }

        let events = std::mem::take(&mut self.events);
        systems::snapshot::build_snapshot(
            self.registry.world(),
            time,
            self.clock.is_running(),
            events,
        )
    }

    // --- Inspection ---

    pub fn card(&self, id: &CardId) -> Option<CardView> {
        let entity = self.registry.entity(id)?;
        systems::snapshot::card_view(self.registry.world(), entity)
    }

    pub fn lifecycle(&self, id: &CardId) -> Option<LifecycleState> {
        self.registry.lifecycle(id)
    }

    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn device_class(&self) -> DeviceClass {
        self.device_class
    }

    /// Latest time seen through frames or input samples.
    pub fn now(&self) -> f64 {
        self.latest_time
    }

    // --- Internals ---

    /// Run all systems in order.
    fn run_systems(&mut self, time: FrameTime) {
        let mut events = Vec::new();
        let world = self.registry.world_mut();

        // 1. Drag pendulum
        systems::drag::run(world, time.dt);
        // 2. Guided flight, capture and force dock
        let ctx = FlightContext {
            now: time.now,
            dt: time.dt,
            viewport: self.viewport,
            docking_budget_secs: self.config.docking_budget_secs,
            force_dock_secs: self.config.force_dock_secs,
        };
        systems::flight::run(world, &ctx, &mut events);
        // 3. Docking settle
        let mut completions = systems::docking::run(world, time.now, self.config.dock_settle_secs);
        // 4. Returning
        completions.extend(systems::returning::run(
            world,
            time.now,
            time.dt,
            self.config.return_timeout_secs,
        ));
        // 5. Publish transforms
        let trace = self.trace.as_mut().map(|t| t.as_mut() as &mut dyn TraceSink);
        systems::snapshot::publish(world, self.sink.as_mut(), trace, time.frame);
        // 6. Cleanup after the grace period
        let removed = systems::cleanup::run(
            world,
            time.now,
            self.config.completion_grace_secs,
            &mut self.despawn_buffer,
        );

        for event in events {
            self.emit(event);
        }
        for (id, success) in completions {
            self.complete(&id, success);
        }
        for tag in removed {
            self.registry.forget(&tag.id);
            self.release_visual(tag);
        }
    }

    /// Report the outcome of a card. Cards cancelled before release have no
    /// callback; the hook map guards against a second call.
    fn complete(&mut self, id: &CardId, success: bool) {
        match self.hooks.remove(id) {
            Some(hook) => hook(success),
            None => log::debug!("{id} completed without a pending callback"),
        }
        if success {
            log::info!("{id} docked");
        } else {
            log::info!("{id} returned home");
        }
        self.emit(EngineEvent::Completed {
            card: id.clone(),
            success,
        });
    }

    fn begin_return(&mut self, entity: Entity, id: &CardId, now: f64, reason: ReturnReason) -> bool {
        let started = systems::returning::begin(self.registry.world_mut(), entity, now, reason);
        if started {
            log::debug!("{id} returning: {reason}");
            self.emit(EngineEvent::ReturnStarted {
                card: id.clone(),
                reason,
            });
        }
        started
    }

    /// Send home every flying card released with throw intent.
    fn force_return_thrown(&mut self, now: f64) {
        let thrown: Vec<(Entity, CardId)> = self
            .registry
            .world()
            .query::<(&CardTag, &Lifecycle, &Flight)>()
            .iter()
            .filter(|(_, (_, life, flight))| {
                life.state == LifecycleState::Flying && flight.throw_intent
            })
            .map(|(entity, (tag, _, _))| (entity, tag.id.clone()))
            .collect();
        for (entity, id) in thrown {
            self.begin_return(entity, &id, now, ReturnReason::ForcedByNewGrab);
        }
    }

    fn remove_card(&mut self, id: &CardId) {
        self.hooks.remove(id);
        if let Some(tag) = self.registry.despawn(id) {
            self.release_visual(tag);
        }
    }

    fn release_visual(&mut self, tag: CardTag) {
        self.sink.release(tag.visual);
        log::debug!("{} removed, {} released", tag.id, tag.visual);
        self.emit(EngineEvent::Removed { card: tag.id });
    }

    fn emit(&mut self, event: EngineEvent) {
        if let Some(trace) = self.trace.as_mut() {
            trace.record_event(&event);
        }
        self.events.push(event);
    }

    fn observe(&mut self, time: f64) {
        if time.is_finite() && time > self.latest_time {
            self.latest_time = time;
        }
    }
}

fn reject_input(field: &'static str, reason: &'static str) -> EngineError {
    log::warn!("invalid input `{field}`: {reason}");
    EngineError::invalid_input(field, reason)
}

fn check_sample(input: &InputSample) -> Result<(), EngineError> {
    if !is_valid_point(input.point) {
        return Err(reject_input("point", "not a finite point in range"));
    }
    if !input.timestamp.is_finite() || input.timestamp < 0.0 {
        return Err(reject_input("timestamp", "not a finite non-negative time"));
    }
    Ok(())
}
