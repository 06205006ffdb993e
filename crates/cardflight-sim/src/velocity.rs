//! Release velocity estimate from recent pointer samples.
//!
//! Only the oldest and newest retained samples are used, so the estimate
//! follows the last few frames of the gesture closely. Its magnitude is
//! capped at `MAX_RELEASE_SPEED`.

use std::collections::VecDeque;

use cardflight_core::constants::{MAX_RELEASE_SPEED, VELOCITY_HISTORY_LEN};
use cardflight_core::types::InputSample;
use cardflight_core::DVec2;

use crate::guidance::clamp_speed;

/// Bounded history of pointer samples for one gesture.
#[derive(Debug, Clone)]
pub struct VelocityTracker {
    samples: VecDeque<InputSample>,
    capacity: usize,
}

impl Default for VelocityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl VelocityTracker {
    pub fn new() -> Self {
        Self::with_capacity(VELOCITY_HISTORY_LEN)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest beyond capacity.
    pub fn add_sample(&mut self, sample: InputSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Velocity between the oldest and newest sample in px/s.
    ///
    /// Zero with fewer than two samples or when no time has passed. Samples
    /// a vanishing time apart give a capped speed in the gesture's direction.
    pub fn estimate_velocity(&self) -> DVec2 {
        let (Some(oldest), Some(newest)) = (self.samples.front(), self.samples.back()) else {
            return DVec2::ZERO;
        };
        if self.samples.len() < 2 {
            return DVec2::ZERO;
        }
        let elapsed = newest.timestamp - oldest.timestamp;
        if elapsed <= 0.0 || !elapsed.is_finite() {
            return DVec2::ZERO;
        }
        clamp_speed((newest.point - oldest.point) / elapsed, MAX_RELEASE_SPEED)
    }

    /// Forget the current gesture.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
