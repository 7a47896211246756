//! Application orchestration: state, input handling, asset loading and the
//! transient effects overlay.

pub mod asset_runtime;
pub mod event;
pub mod handler;
pub mod overlay;
pub mod state;
