//! Core types and definitions for the cardflight engine.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometric types, components, configuration, errors, events and frame
//! snapshots. It has no dependency on any rendering or input framework.

pub mod components;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod state;
pub mod types;

pub use glam::DVec2;
