//! Application-level orchestration.
//!
//! This module owns the animation session lifecycle (start/pause/reset/quit)
//! behind a command channel. UI/CLI layers call into this module to keep
//! responsibilities separated.

mod controller;

pub(crate) use controller::{run_controller, UiCommand};
