//! ECS systems that operate on the card world each frame.
//!
//! Systems are free functions over `&mut World`. Each handles one lifecycle
//! state and never reads another card's state, so update order between cards
//! does not matter.

pub mod cleanup;
pub mod docking;
pub mod drag;
pub mod flight;
pub mod returning;
pub mod snapshot;
