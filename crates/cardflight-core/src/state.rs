//! Frame snapshot: the visible engine state after each tick.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::components::FlightDescriptor;
use crate::enums::LifecycleState;
use crate::events::EngineEvent;
use crate::types::{CardId, CardTransform, FrameTime};

/// Complete engine state published after each tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub time: FrameTime,
    /// Whether the frame loop is still running after this tick.
    pub running: bool,
    /// Active cards ordered by id.
    pub cards: Vec<CardView>,
    /// Events raised since the previous snapshot.
    pub events: Vec<EngineEvent>,
}

/// One active card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardView {
    pub id: CardId,
    pub lifecycle: LifecycleState,
    /// When the current lifecycle state was entered.
    pub state_entered_at: f64,
    /// What the rendering surface receives.
    pub transform: CardTransform,
    /// Pivot point while dragging, center afterwards.
    pub position: DVec2,
    pub velocity: DVec2,
    pub angular_velocity: f64,
    pub pivot_offset: DVec2,
    pub target_anchor: Option<DVec2>,
    pub home_anchor: DVec2,
    /// Hand slot the card returns to, when known.
    pub slot: Option<usize>,
    /// Speed at release, while flying.
    pub release_speed: Option<f64>,
    pub flight: Option<FlightDescriptor>,
}
