//! Engine configuration.
//!
//! Defaults come from `constants`; a config can also be loaded from JSON.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::DeviceClass;
use crate::error::EngineError;
use crate::types::Viewport;

/// Configuration for a new engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for per-card center-of-mass jitter. Same seed = same simulation.
    pub seed: u64,
    pub device_class: DeviceClass,
    /// Viewport at startup; updated later through `set_viewport`.
    pub viewport: Viewport,
    /// Release-to-arrival guarantee for accepted throws (seconds).
    pub docking_budget_secs: f64,
    pub force_dock_secs: f64,
    pub dock_settle_secs: f64,
    pub completion_grace_secs: f64,
    pub return_timeout_secs: f64,
    pub max_frame_dt: f64,
    /// Card size used when a grab carries no layout context.
    pub default_card_size: DVec2,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            device_class: DeviceClass::default(),
            viewport: Viewport::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT),
            docking_budget_secs: DOCKING_BUDGET_SECS,
            force_dock_secs: FORCE_DOCK_SECS,
            dock_settle_secs: DOCK_SETTLE_SECS,
            completion_grace_secs: COMPLETION_GRACE_SECS,
            return_timeout_secs: RETURN_TIMEOUT_SECS,
            max_frame_dt: MAX_FRAME_DT,
            default_card_size: DVec2::new(DEFAULT_CARD_WIDTH, DEFAULT_CARD_HEIGHT),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all timings are usable and the time-budget guarantee holds.
    pub fn validate(&self) -> Result<(), EngineError> {
        let timings = [
            ("docking_budget_secs", self.docking_budget_secs),
            ("force_dock_secs", self.force_dock_secs),
            ("dock_settle_secs", self.dock_settle_secs),
            ("completion_grace_secs", self.completion_grace_secs),
            ("return_timeout_secs", self.return_timeout_secs),
            ("max_frame_dt", self.max_frame_dt),
        ];
        for (name, value) in timings {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.force_dock_secs + self.dock_settle_secs > self.completion_grace_secs {
            return Err(EngineError::InvalidConfig(format!(
                "force_dock_secs + dock_settle_secs ({:.3}) exceeds completion_grace_secs ({:.3})",
                self.force_dock_secs + self.dock_settle_secs,
                self.completion_grace_secs
            )));
        }
        if !self.viewport.is_valid() {
            return Err(EngineError::InvalidConfig("viewport must be positive".into()));
        }
        if !self.default_card_size.is_finite() || self.default_card_size.min_element() <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "default_card_size must be positive".into(),
            ));
        }
        Ok(())
    }
}
