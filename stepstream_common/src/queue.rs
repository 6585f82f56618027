//! Execution-queue trait.
//!
//! The real-time execution unit (the hardware-paced consumer that turns
//! step counts into pulse trains with acceleration ramps) is reached
//! exclusively through this trait. The machine control layer never sees
//! its internals.

use crate::command::MoveCommand;
use crate::error::QueueError;
use std::io::Write;

/// Interface to the asynchronous, hardware-paced motion command queue.
///
/// # Lifecycle
///
/// 1. `init()` — once, before any command is submitted
/// 2. `enqueue()` / `wait_until_empty()` — during streaming
/// 3. `exit_graceful()` or `exit_forced()` — exactly one of them, at
///    teardown
///
/// # Contracts
///
/// | Operation | Blocking behavior |
/// |-----------|-------------------|
/// | `enqueue()` | May block on a full queue (backpressure); never drops |
/// | `wait_until_empty()` | Blocks until all accepted commands executed |
/// | `exit_graceful()` | Blocks until drained, then stops the consumer |
/// | `exit_forced()` | Stops the consumer, abandoning pending commands |
pub trait MotionQueue {
    /// Prepare the execution unit. `acceleration` is in steps/s².
    ///
    /// Hardware backends report privilege problems as
    /// [`QueueError::PermissionDenied`].
    fn init(&mut self, acceleration: f64) -> Result<(), QueueError>;

    /// Submit one move. Fire-and-forget from the caller's perspective:
    /// the queue may block the caller while full, but the caller never
    /// retries or drops. `sink` is an optional channel for diagnostics
    /// the backend wants to surface to the operator.
    fn enqueue(&mut self, command: &MoveCommand, sink: Option<&mut dyn Write>);

    /// Block until every accepted command has been executed.
    fn wait_until_empty(&mut self);

    /// Drain the queue, then stop the execution unit.
    fn exit_graceful(&mut self);

    /// Stop the execution unit without draining. Pending commands are
    /// intentionally lost; prompt shutdown wins over completeness.
    fn exit_forced(&mut self);
}
