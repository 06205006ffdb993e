//! Hand layout for cardflight.
//!
//! Computes card size, container geometry and per-slot offsets for a hand of
//! cards. Pure and deterministic: identical inputs give identical results.

pub mod hand;

pub use hand::{compute_layout, compute_row_layout, LayoutResult, SlotPosition};

#[cfg(test)]
mod tests;
