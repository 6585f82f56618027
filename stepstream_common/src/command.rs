//! Move commands handed to the execution queue.

use crate::axis::{Axis, AXIS_COUNT};

/// One coordinated move request for the real-time execution unit:
/// signed step deltas per axis plus the overall travel speed.
///
/// A command whose step counts are all zero is a no-op and is never
/// forwarded downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveCommand {
    /// Signed step delta per axis, indexed by `Axis as usize`.
    pub steps: [i32; AXIS_COUNT],
    /// Travel speed in steps per second.
    pub travel_speed: f64,
}

impl MoveCommand {
    /// Returns true if any axis has a nonzero step count.
    #[inline]
    pub fn has_work(&self) -> bool {
        self.steps.iter().any(|&s| s != 0)
    }

    /// Step delta for the given axis.
    #[inline]
    pub fn step(&self, axis: Axis) -> i32 {
        self.steps[axis.index()]
    }
}
