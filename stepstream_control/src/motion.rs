//! Motion math: real-world targets to step deltas, feedrate
//! resolution, and the move emitter feeding the execution queue.

use crate::controller::MachineController;
use std::fmt;
use stepstream_common::axis::{Axis, AXIS_COUNT};
use stepstream_common::command::MoveCommand;

/// Substitute step rate when a move resolves to speed 0. The execution
/// unit would stall forever on a rate of zero.
pub(crate) const ZERO_FEEDRATE_OVERRIDE_HZ: f64 = 5.0;

impl MachineController {
    /// Write one diagnostic line to the session sink, if present, and
    /// flush it immediately.
    pub(crate) fn msg(&mut self, args: fmt::Arguments<'_>) {
        if let Some(sink) = self.sink.as_deref_mut() {
            let _ = sink.write_fmt(args);
            let _ = sink.flush();
        }
    }

    /// Resolve the effective feedrate of a coordinated move [mm/s].
    ///
    /// A positive request overwrites the sticky feedrate (scaled by the
    /// global factor); a non-positive request reuses it. The program
    /// override applies on top, and the machine maximum caps the
    /// result.
    pub(crate) fn coordinated_feedrate(&mut self, requested: f64) -> f64 {
        if requested > 0.0 {
            self.current_feedrate = self.cfg.speed_factor * requested;
        }
        let feedrate = self.prog_speed_factor * self.current_feedrate;
        feedrate.min(self.cfg.machine_max_feedrate())
    }

    /// Resolve the effective feedrate of a rapid move [mm/s].
    ///
    /// Rapids run at the machine maximum; an explicit positive request
    /// may only slow them down, never exceed the ceiling.
    pub(crate) fn rapid_feedrate(&self, requested: f64) -> f64 {
        let max = self.cfg.machine_max_feedrate();
        let given = self.cfg.speed_factor * self.prog_speed_factor * requested;
        if requested > 0.0 && given < max {
            given
        } else {
            max
        }
    }

    /// Move to an absolute real-world target at the given feedrate.
    ///
    /// Converts the target to steps per axis, emits the delta move, and
    /// unconditionally adopts the target as the new position — an
    /// idealized machine with no missed steps, not a closed loop.
    pub(crate) fn machine_move(&mut self, feedrate: f64, target_mm: &[f64; AXIS_COUNT]) {
        let mut target_steps = [0i32; AXIS_COUNT];
        for (i, target) in target_mm.iter().enumerate() {
            target_steps[i] = (target * self.cfg.steps_per_mm[i]).round() as i32;
        }

        let mut deltas = [0i32; AXIS_COUNT];
        for i in 0..AXIS_COUNT {
            deltas[i] = target_steps[i] - self.position_steps[i];
        }

        self.emit_steps(feedrate, &deltas);

        self.position_steps = target_steps;
    }

    /// Build a move command from step deltas and hand it to the
    /// execution queue.
    ///
    /// An all-zero delta set is dropped before any queue interaction.
    /// In synchronous mode the queue is drained before the submit; in
    /// dry-run mode the command is computed (and possibly printed) but
    /// the queue is never touched.
    pub(crate) fn emit_steps(&mut self, feedrate: f64, deltas: &[i32; AXIS_COUNT]) {
        let mut command = MoveCommand {
            steps: *deltas,
            travel_speed: 0.0,
        };

        if !command.has_work() {
            return;
        }

        // The axis with the fewest steps per mm bounds the feedrate in
        // steps/second. For now that is pinned to X, with no weighting
        // by the distance each axis actually travels; changing this
        // changes physical motion timing.
        let min_feedrate_relevant_steps_per_mm = self.cfg.steps_per_mm[Axis::X.index()];

        let dx = command.step(Axis::X);
        let dy = command.step(Axis::Y);
        let max_axis_steps = dx.abs().max(dy.abs());
        command.travel_speed = if max_axis_steps > 0 {
            let euclid_steps = (dx as f64).hypot(dy as f64);
            max_axis_steps as f64 * min_feedrate_relevant_steps_per_mm * feedrate / euclid_steps
        } else {
            // No in-plane travel: fall back to a per-axis-independent
            // rate instead of dividing by zero.
            min_feedrate_relevant_steps_per_mm * feedrate
        };

        if command.travel_speed == 0.0 {
            self.msg(format_args!(
                "// Ignoring speed of 0, setting to {:.6} mm/s\n",
                ZERO_FEEDRATE_OVERRIDE_HZ / min_feedrate_relevant_steps_per_mm
            ));
            command.travel_speed = ZERO_FEEDRATE_OVERRIDE_HZ;
        }

        if !self.cfg.dry_run {
            if self.cfg.synchronous {
                self.queue.wait_until_empty();
            }
            self.queue.enqueue(&command, self.sink.as_deref_mut());
        }

        if self.cfg.debug_print {
            let z = command.step(Axis::Z);
            let e = command.step(Axis::E);
            if z != 0 {
                self.msg(format_args!(
                    "// ({:6}, {:6}) Z:{:<3} E:{:<2} step kHz:{:<8.3} ({:.1} mm/s)\n",
                    command.step(Axis::X),
                    command.step(Axis::Y),
                    z,
                    e,
                    command.travel_speed / 1000.0,
                    feedrate
                ));
            } else {
                // Less clutter when there is no Z movement.
                self.msg(format_args!(
                    "// ({:6}, {:6})       E:{:<3} step kHz:{:<8.3} ({:.1} mm/s)\n",
                    command.step(Axis::X),
                    command.step(Axis::Y),
                    e,
                    command.travel_speed / 1000.0,
                    feedrate
                ));
            }
        }
    }
}
