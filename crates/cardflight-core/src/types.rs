//! Fundamental geometric and identity types.
//!
//! Coordinates are screen pixels with +x to the right and +y down.
//! Time is a monotonic clock in seconds supplied by the caller.

use std::f64::consts::{PI, TAU};
use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::constants::MAX_INPUT_COORDINATE;

/// Identity of a playing card: rank followed by a one-letter suit ("10S", "KH").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rank part of the id (everything but the trailing suit letter).
    pub fn rank(&self) -> &str {
        let mut chars = self.0.char_indices();
        match chars.next_back() {
            Some((idx, _)) => &self.0[..idx],
            None => "",
        }
    }

    /// Trailing suit letter, if any.
    pub fn suit(&self) -> Option<char> {
        self.0.chars().last()
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Opaque handle to the caller's visual proxy. Zero is never a valid handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u64);

impl VisualHandle {
    pub const NULL: VisualHandle = VisualHandle(0);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for VisualHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "visual#{}", self.0)
    }
}

/// One normalized pointer sample from the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputSample {
    pub point: DVec2,
    /// Monotonic timestamp in seconds.
    pub timestamp: f64,
}

impl InputSample {
    pub fn new(x: f64, y: f64, timestamp: f64) -> Self {
        Self {
            point: DVec2::new(x, y),
            timestamp,
        }
    }
}

/// Visible area the cards live in (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn min_dimension(&self) -> f64 {
        self.width.min(self.height)
    }

    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Top-left corner of the hand container, in input coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerFrame {
    pub origin: DVec2,
}

impl ContainerFrame {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            origin: DVec2::new(x, y),
        }
    }
}

/// Pure presentation transform published for one card each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardTransform {
    /// Card center.
    pub position: DVec2,
    /// Radians, clockwise on screen.
    pub rotation: f64,
    pub scale: f64,
}

/// Frame clock state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameTime {
    /// Frames advanced since the engine was created.
    pub frame: u64,
    /// Monotonic time of the latest frame (seconds).
    pub now: f64,
    /// Clamped delta time of the latest frame (seconds).
    pub dt: f64,
}

/// True if the point is finite and inside the accepted coordinate range.
pub fn is_valid_point(p: DVec2) -> bool {
    p.is_finite() && p.x.abs() <= MAX_INPUT_COORDINATE && p.y.abs() <= MAX_INPUT_COORDINATE
}

/// Signed shortest angular distance from `from` to `to`, in (-PI, PI].
pub fn shortest_angle(from: f64, to: f64) -> f64 {
    let diff = (to - from).rem_euclid(TAU);
    if diff > PI {
        diff - TAU
    } else {
        diff
    }
}

/// Card center for a card hanging from `pivot`.
pub fn pivot_to_center(pivot: DVec2, pivot_offset: DVec2, rotation: f64, scale: f64) -> DVec2 {
    pivot - DVec2::from_angle(rotation).rotate(pivot_offset * scale)
}

/// Per-frame factor `per_frame` rescaled to an arbitrary `dt` (60 Hz reference).
pub fn frame_factor(per_frame: f64, dt: f64) -> f64 {
    per_frame.powf(dt * crate::constants::REFERENCE_FRAME_RATE)
}
