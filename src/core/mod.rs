//! Core engine – navigation physics, tile wrapping, per-item springs,
//! gestures and click behaviours.
//!
//! Nothing in this module depends on any TUI or rendering crate.  Time is
//! always passed in, so every piece can be driven by a virtual clock.

pub mod assets;
pub mod behavior;
pub mod clock;
pub mod debounce;
pub mod easing;
pub mod effects;
pub mod engine;
pub mod follower;
pub mod gesture;
pub mod grid;
pub mod momentum;
pub mod timers;
pub mod vec2;
pub mod velocity;
pub mod wrap;
