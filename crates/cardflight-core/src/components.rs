//! ECS components for hecs entities.
//!
//! Components are plain data structs with no methods.
//! Behavior lives in the systems of the simulation crate.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{CardId, VisualHandle};

/// Identity of the card and the visual proxy the engine owns while it is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardTag {
    pub id: CardId,
    pub visual: VisualHandle,
}

/// Integrated motion state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    /// Pivot point while dragging, card center afterwards.
    pub position: DVec2,
    pub velocity: DVec2,
    pub rotation: f64,
    pub angular_velocity: f64,
    pub scale: f64,
}

/// How the card was picked up. Fixed for the duration of the grab.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grip {
    /// From the card center to the grab point.
    pub pivot_offset: DVec2,
    /// From the card center to the center of mass.
    pub center_of_mass: DVec2,
    /// Latest input point reported by `drag`.
    pub input_point: DVec2,
    /// Input point seen by the previous drag tick.
    pub last_tick_input: Option<DVec2>,
    pub grabbed_at: f64,
}

/// Current lifecycle state and when it was entered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub state: LifecycleState,
    pub entered_at: f64,
}

/// Points the card can be driven toward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchors {
    /// Point currently driven toward (drop target or home).
    pub target: Option<DVec2>,
    /// Center of the card's slot in the hand.
    pub home: DVec2,
    /// Index of that slot, when known.
    pub slot: Option<usize>,
}

/// Cubic correction curve for off-target throws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionCurve {
    pub start: DVec2,
    pub control_a: DVec2,
    pub control_b: DVec2,
    pub end: DVec2,
    pub duration_secs: f64,
}

/// Classification of an accepted throw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightDescriptor {
    pub speed_class: SpeedClass,
    pub aim_offset: f64,
    pub on_target: bool,
    /// Flight time after which guidance engages (seconds).
    pub guidance_activation_secs: f64,
    pub correction_curve: Option<CorrectionCurve>,
    pub elapsed_secs: f64,
}

/// Direct interpolation to the target once the budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceDock {
    pub started_at: f64,
    pub from: DVec2,
}

/// Present while Flying.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub descriptor: FlightDescriptor,
    pub released_at: f64,
    pub release_speed: f64,
    pub throw_intent: bool,
    pub force_dock: Option<ForceDock>,
}

/// Present while Docking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Docking {
    pub started_at: f64,
    pub start_rotation: f64,
    pub target_rotation: f64,
    pub start_scale: f64,
}

/// Present while Returning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Returning {
    pub started_at: f64,
    pub reason: ReturnReason,
}

/// Present once the outcome has been reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Completed {
    pub at: f64,
    pub success: bool,
}
