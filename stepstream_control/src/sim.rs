//! Simulation execution queue.
//!
//! Stands in for the real-time execution unit when no hardware is
//! present: accepts every command, "executes" instantly, and reports
//! what it saw through the log. Useful for exercising the full
//! streaming path on a development machine.

use std::io::Write;
use stepstream_common::command::MoveCommand;
use stepstream_common::error::QueueError;
use stepstream_common::queue::MotionQueue;
use tracing::{debug, info};

/// Execution queue that executes nothing.
#[derive(Debug, Default)]
pub struct SimQueue {
    accepted: u64,
}

impl SimQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commands accepted so far.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }
}

impl MotionQueue for SimQueue {
    fn init(&mut self, acceleration: f64) -> Result<(), QueueError> {
        info!("Simulation queue ready (acceleration {acceleration:.0} steps/s²)");
        Ok(())
    }

    fn enqueue(&mut self, command: &MoveCommand, _sink: Option<&mut dyn Write>) {
        self.accepted += 1;
        debug!(
            "Move #{}: steps {:?} at {:.1} steps/s",
            self.accepted, command.steps, command.travel_speed
        );
    }

    // The simulated queue drains the moment a command arrives.
    fn wait_until_empty(&mut self) {}

    fn exit_graceful(&mut self) {
        info!(
            "Simulation queue drained and stopped ({} commands)",
            self.accepted
        );
    }

    fn exit_forced(&mut self) {
        info!(
            "Simulation queue stopped without draining ({} commands accepted)",
            self.accepted
        );
    }
}
