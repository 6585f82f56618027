//! Parser event handling: the controller side of the event interface.

use crate::controller::MachineController;
use std::thread;
use std::time::Duration;
use stepstream_common::axis::{Axis, AxisMask, ALL_AXES, AXIS_COUNT};
use stepstream_common::events::MachineEvents;

const VERSION_STRING: &str = "PROTOCOL_VERSION:0.1 FIRMWARE_NAME:StepStream \
FIRMWARE_URL:http%3A//github.com/stepstream/stepstream";

impl MachineEvents for MachineController {
    fn coordinated_move(&mut self, feedrate: f64, target_mm: &[f64; AXIS_COUNT]) {
        let feedrate = self.coordinated_feedrate(feedrate);
        self.machine_move(feedrate, target_mm);
    }

    fn rapid_move(&mut self, feedrate: f64, target_mm: &[f64; AXIS_COUNT]) {
        let feedrate = self.rapid_feedrate(feedrate);
        self.machine_move(feedrate, target_mm);
    }

    /// Return the masked axes to step position zero.
    ///
    /// There are no end-stops: the last software position is assumed
    /// accurate, and "home" is a rapid to zero of the requested axes.
    /// The extrusion channel never moves for homing but its logical
    /// position is still reset.
    fn go_home(&mut self, axes: AxisMask) {
        let mut deltas = [0i32; AXIS_COUNT];
        for axis in ALL_AXES {
            if axes.has(axis) {
                if !axis.is_extrusion() {
                    deltas[axis.index()] = -self.position_steps[axis.index()];
                }
                self.position_steps[axis.index()] = 0;
            }
        }

        self.msg(format_args!(
            "// StepStream: Homing requested (0x{:02x}), but no endstops \
are configured; moving difference steps ({}, {}, {})\n",
            axes.bits(),
            deltas[Axis::X.index()],
            deltas[Axis::Y.index()],
            deltas[Axis::Z.index()]
        ));

        let feedrate = self.cfg.machine_max_feedrate();
        self.emit_steps(feedrate, &deltas);
    }

    /// Pause for the given duration once all queued motion finished.
    /// Dry-run skips the queue but keeps the pause, so simulated
    /// playback preserves its timing.
    fn dwell(&mut self, milliseconds: f64) {
        if !self.cfg.dry_run {
            self.queue.wait_until_empty();
        }
        thread::sleep(Duration::from_micros(
            (milliseconds.max(0.0) * 1000.0) as u64,
        ));
    }

    fn set_speed_factor(&mut self, factor: f64) {
        let mut factor = factor;
        if factor < 0.0 {
            // M220 S-10 means: 90%.
            factor = 1.0 + factor;
        }
        if factor < 0.005 {
            self.msg(format_args!(
                "// M220: Not accepting speed factors < 0.5% (got {:.1}%)\n",
                100.0 * factor
            ));
            return;
        }
        self.prog_speed_factor = factor;
    }

    fn set_fan_speed(&mut self, value: f64) {
        self.msg(format_args!(
            "// StepStream: set_fan_speed({value:.0}) not implemented.\n"
        ));
    }

    fn set_temperature(&mut self, degrees_c: f64) {
        self.msg(format_args!(
            "// StepStream: set_temperature({degrees_c:.1}) not implemented.\n"
        ));
    }

    fn wait_temperature(&mut self) {
        self.msg(format_args!(
            "// StepStream: wait_temperature() not implemented.\n"
        ));
    }

    fn disable_motors(&mut self) {
        self.msg(format_args!(
            "// StepStream: disable_motors() not implemented.\n"
        ));
    }

    /// Status inquiries answered on the diagnostic channel; everything
    /// else is echoed back for debugging. Machine state is never
    /// touched here.
    fn unhandled(&mut self, letter: char, value: f64, remainder: &str) {
        match value as i32 {
            // No temperature sensor present.
            105 => self.msg(format_args!("ok T-300\n")),
            114 => {
                let [x, y, z, e] = [Axis::X, Axis::Y, Axis::Z, Axis::E].map(|axis| {
                    self.position_steps[axis.index()] as f64
                        / self.cfg.steps_per_mm[axis.index()]
                });
                self.msg(format_args!("ok C: X:{x:.3} Y:{y:.3} Z{z:.3} E{e:.3}\n"));
            }
            115 => self.msg(format_args!("ok {VERSION_STRING}\n")),
            _ => self.msg(format_args!(
                "// StepStream: didn't understand ('{}', {}, '{}')\n",
                letter, value as i32, remainder
            )),
        }
    }
}
