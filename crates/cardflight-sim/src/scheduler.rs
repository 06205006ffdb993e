//! Shared frame clock.
//!
//! The clock runs while at least one card is tracked. Delta time is clamped
//! so a stalled frame cannot produce a huge integration step.

use cardflight_core::types::FrameTime;

#[derive(Debug, Clone)]
pub struct FrameClock {
    running: bool,
    last: Option<f64>,
    time: FrameTime,
    max_dt: f64,
}

impl FrameClock {
    pub fn new(max_dt: f64) -> Self {
        Self {
            running: false,
            last: None,
            time: FrameTime::default(),
            max_dt,
        }
    }

    /// Start the loop at `now`. No-op when already running.
    pub fn start(&mut self, now: f64) {
        if !self.running {
            self.running = true;
            self.last = Some(now);
            self.time.now = now;
            self.time.dt = 0.0;
        }
    }

    /// Advance to `now` and return the frame time. Delta time is clamped to
    /// `[0, max_dt]`; a stopped clock does not advance.
    pub fn advance(&mut self, now: f64) -> FrameTime {
        if !self.running {
            self.time.dt = 0.0;
            return self.time;
        }
        let last = self.last.unwrap_or(now);
        let dt = if now.is_finite() {
            (now - last).clamp(0.0, self.max_dt)
        } else {
            0.0
        };
        if now.is_finite() && now > last {
            self.last = Some(now);
            self.time.now = now;
        }
        self.time.frame += 1;
        self.time.dt = dt;
        self.time
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.last = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn time(&self) -> FrameTime {
        self.time
    }
}
