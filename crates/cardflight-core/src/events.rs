//! Events emitted by the engine for callers and trace sinks.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::CardId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    /// A card started being tracked.
    Grabbed { card: CardId, pivot_offset: DVec2 },
    /// A release was accepted as a throw.
    ThrowAccepted {
        card: CardId,
        speed_class: SpeedClass,
        on_target: bool,
        aim_offset: f64,
        throw_intent: bool,
    },
    /// A release was refused; the card goes home.
    ThrowRejected { card: CardId, reason: String },
    /// A card entered the Returning state.
    ReturnStarted { card: CardId, reason: ReturnReason },
    /// The docking budget ran out and the direct fallback engaged.
    ForceDockStarted { card: CardId, distance: f64 },
    /// A flying card was captured at its target.
    Captured { card: CardId, flight_secs: f64 },
    /// The card reached Completed; the callback, if any, has fired.
    Completed { card: CardId, success: bool },
    /// The card left the registry and its visual proxy was released.
    Removed { card: CardId },
}

impl EngineEvent {
    pub fn card(&self) -> &CardId {
        match self {
            EngineEvent::Grabbed { card, .. }
            | EngineEvent::ThrowAccepted { card, .. }
            | EngineEvent::ThrowRejected { card, .. }
            | EngineEvent::ReturnStarted { card, .. }
            | EngineEvent::ForceDockStarted { card, .. }
            | EngineEvent::Captured { card, .. }
            | EngineEvent::Completed { card, .. }
            | EngineEvent::Removed { card } => card,
        }
    }
}
