//! Ports between the engine and the presentation layer.
//!
//! The engine never touches a render target. It hands a pure transform per
//! frame to a `TransformSink`; an adapter on the other side applies it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use cardflight_core::events::EngineEvent;
use cardflight_core::types::{CardId, CardTransform, VisualHandle};
use cardflight_core::DVec2;

/// Receives the transform of every active card.
pub trait TransformSink {
    /// Apply `transform` to the visual proxy.
    fn apply(&mut self, visual: VisualHandle, transform: &CardTransform);

    /// Ownership of the proxy returns to the caller. The adapter must revert
    /// any transient styling it applied.
    fn release(&mut self, visual: VisualHandle);
}

/// Passive observer for debugging trajectories. Never feeds back.
pub trait TraceSink {
    fn record_event(&mut self, event: &EngineEvent);

    fn record_point(&mut self, _card: &CardId, _frame: u64, _position: DVec2) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TransformSink for NullSink {
    fn apply(&mut self, _visual: VisualHandle, _transform: &CardTransform) {}

    fn release(&mut self, _visual: VisualHandle) {}
}

#[derive(Debug, Default)]
struct SinkLog {
    applied: Vec<(VisualHandle, CardTransform)>,
    released: Vec<VisualHandle>,
}

/// Shared-handle sink that records every call. Clones see the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: Rc<RefCell<SinkLog>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_count(&self, visual: VisualHandle) -> usize {
        self.log
            .borrow()
            .applied
            .iter()
            .filter(|(v, _)| *v == visual)
            .count()
    }

    pub fn last_transform(&self, visual: VisualHandle) -> Option<CardTransform> {
        self.log
            .borrow()
            .applied
            .iter()
            .rev()
            .find(|(v, _)| *v == visual)
            .map(|(_, t)| *t)
    }

    pub fn transforms(&self, visual: VisualHandle) -> Vec<CardTransform> {
        self.log
            .borrow()
            .applied
            .iter()
            .filter(|(v, _)| *v == visual)
            .map(|(_, t)| *t)
            .collect()
    }

    pub fn released(&self) -> Vec<VisualHandle> {
        self.log.borrow().released.clone()
    }
}

impl TransformSink for RecordingSink {
    fn apply(&mut self, visual: VisualHandle, transform: &CardTransform) {
        self.log.borrow_mut().applied.push((visual, *transform));
    }

    fn release(&mut self, visual: VisualHandle) {
        self.log.borrow_mut().released.push(visual);
    }
}

#[derive(Debug, Default)]
struct TraceLog {
    events: Vec<EngineEvent>,
    points: HashMap<CardId, Vec<(u64, DVec2)>>,
}

/// Shared-handle trace sink that records events and trajectories.
#[derive(Debug, Clone, Default)]
pub struct RecordingTrace {
    log: Rc<RefCell<TraceLog>>,
}

impl RecordingTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.log.borrow().events.clone()
    }

    pub fn trajectory(&self, card: &CardId) -> Vec<(u64, DVec2)> {
        self.log
            .borrow()
            .points
            .get(card)
            .cloned()
            .unwrap_or_default()
    }
}

impl TraceSink for RecordingTrace {
    fn record_event(&mut self, event: &EngineEvent) {
        self.log.borrow_mut().events.push(event.clone());
    }

    fn record_point(&mut self, card: &CardId, frame: u64, position: DVec2) {
        self.log
            .borrow_mut()
            .points
            .entry(card.clone())
            .or_default()
            .push((frame, position));
    }
}
