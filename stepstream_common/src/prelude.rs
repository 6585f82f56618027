//! Prelude module for common re-exports.
//!
//! Consumers can `use stepstream_common::prelude::*;` and get the core
//! vocabulary without listing individual paths.

// ─── Axes ───────────────────────────────────────────────────────────
pub use crate::axis::{Axis, AxisMask, ALL_AXES, AXIS_COUNT};

// ─── Commands ───────────────────────────────────────────────────────
pub use crate::command::MoveCommand;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{load_config, MachineConfig};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{ControlError, QueueError};

// ─── Collaborator traits ────────────────────────────────────────────
pub use crate::events::{GcodeParser, MachineEvents};
pub use crate::queue::MotionQueue;
