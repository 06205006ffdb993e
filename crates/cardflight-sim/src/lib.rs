//! Physics and animation engine for grabbed, dragged and thrown cards.
//!
//! Owns the hecs ECS world, runs the per-state systems once per frame,
//! and publishes pure transforms through an injected sink.

pub mod engine;
pub mod guidance;
pub mod personality;
pub mod registry;
pub mod scheduler;
pub mod sink;
pub mod systems;
pub mod throw;
pub mod velocity;

pub use cardflight_core;
pub use cardflight_layout;
pub use engine::{CardPhysicsEngine, ReleaseOutcome};
pub use registry::LayoutContext;
pub use sink::{NullSink, RecordingSink, RecordingTrace, TraceSink, TransformSink};

#[cfg(test)]
mod tests;
