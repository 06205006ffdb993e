//! Enumeration types used throughout the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{MOBILE_MAX_WIDTH, TABLET_MAX_WIDTH};

/// Lifecycle of a tracked card. Exactly one at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Pinned to the input point, swinging as a pendulum.
    #[default]
    Dragging,
    /// Released; the throw is being classified.
    ValidatingThrow,
    /// Airborne toward the drop target.
    Flying,
    /// Captured at the target, settling.
    Docking,
    /// Heading back to the hand slot.
    Returning,
    /// Outcome reported, waiting for removal.
    Completed,
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Completed)
    }
}

/// Release speed class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeedClass {
    Slow,
    Medium,
    Fast,
}

/// Input device class; scales the aim allowance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    Mobile,
    Tablet,
    #[default]
    Desktop,
}

impl DeviceClass {
    pub fn from_viewport_width(width: f64) -> Self {
        if width < MOBILE_MAX_WIDTH {
            DeviceClass::Mobile
        } else if width < TABLET_MAX_WIDTH {
            DeviceClass::Tablet
        } else {
            DeviceClass::Desktop
        }
    }
}

/// Hand packing strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutMode {
    /// Cards fit with margins and are centered as a group.
    #[default]
    Centered,
    /// Cards are edge-anchored and overlap.
    Overlapping,
}

/// Why a release was refused as a throw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ThrowRejection {
    /// No drop target was supplied.
    MissingTarget,
    /// The drop target contained non-finite or out-of-range coordinates.
    MalformedTarget,
    /// Release position or velocity was not finite.
    NonFiniteRelease,
    /// Release direction points into the downward arc.
    DownwardArc { angle_deg: f64 },
    /// Target is far but the release was too slow to reach it.
    TooSlow { distance: f64, speed: f64 },
    /// The velocity ray misses the target by more than the allowance.
    AimOffset { offset: f64, allowance: f64 },
}

impl fmt::Display for ThrowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThrowRejection::MissingTarget => write!(f, "no drop target supplied"),
            ThrowRejection::MalformedTarget => write!(f, "drop target is malformed"),
            ThrowRejection::NonFiniteRelease => write!(f, "release state is not finite"),
            ThrowRejection::DownwardArc { angle_deg } => {
                write!(f, "thrown downward ({angle_deg:.0} deg)")
            }
            ThrowRejection::TooSlow { distance, speed } => write!(
                f,
                "too slow for the distance ({speed:.0} px/s over {distance:.0} px)"
            ),
            ThrowRejection::AimOffset { offset, allowance } => write!(
                f,
                "missed the target by {offset:.0} px (allowance {allowance:.0} px)"
            ),
        }
    }
}

/// Why a card is heading back to the hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ReturnReason {
    InvalidThrow { rejection: ThrowRejection },
    Cancelled,
    ForcedByNewGrab,
    EmergencyReset,
}

impl fmt::Display for ReturnReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnReason::InvalidThrow { rejection } => write!(f, "invalid throw: {rejection}"),
            ReturnReason::Cancelled => write!(f, "cancelled"),
            ReturnReason::ForcedByNewGrab => write!(f, "another card was grabbed"),
            ReturnReason::EmergencyReset => write!(f, "emergency reset"),
        }
    }
}
