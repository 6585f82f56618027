//! Parser-facing event interface.
//!
//! The G-Code parser normalizes text into typed machine events and
//! delivers them synchronously, in input order, through
//! [`MachineEvents`]. The machine control layer implements the trait;
//! the parser never learns anything about machine state beyond what the
//! events carry.

use crate::axis::{AxisMask, AXIS_COUNT};

/// Semantic machine events emitted by the G-Code parser.
///
/// Coordinates are absolute real-world millimeters for all axes (the
/// parser has already applied unit, relative-mode and offset
/// normalization). Feedrates are mm/s; zero means "not specified".
///
/// The not-yet-implemented hardware operations (`set_fan_speed`,
/// `set_temperature`, `wait_temperature`, `disable_motors`) are
/// deliberately required methods: an implementation must decide to
/// acknowledge them, it cannot lose them to a missing case.
pub trait MachineEvents {
    /// Linear move at the requested feedrate (G1).
    fn coordinated_move(&mut self, feedrate: f64, target_mm: &[f64; AXIS_COUNT]);

    /// Repositioning move at maximum safe speed (G0).
    fn rapid_move(&mut self, feedrate: f64, target_mm: &[f64; AXIS_COUNT]);

    /// Return the masked axes to their origin (G28).
    fn go_home(&mut self, axes: AxisMask);

    /// Pause for the given number of milliseconds (G4).
    fn dwell(&mut self, milliseconds: f64);

    /// Program speed override (M220), as a factor (1.0 = 100%).
    fn set_speed_factor(&mut self, factor: f64);

    /// Fan control (M106/M107). Not implemented by current hardware.
    fn set_fan_speed(&mut self, value: f64);

    /// Hotend temperature (M104/M109). Not implemented by current hardware.
    fn set_temperature(&mut self, degrees_c: f64);

    /// Wait for temperature (M109/M116). Not implemented by current hardware.
    fn wait_temperature(&mut self);

    /// Release motor holding torque (M84). Not implemented by current hardware.
    fn disable_motors(&mut self);

    /// Catch-all for words the parser does not understand, including
    /// status inquiries. `remainder` is the unparsed rest of the line.
    fn unhandled(&mut self, letter: char, value: f64, remainder: &str);
}

/// A G-Code parser: consumes one line of text, emits machine events.
pub trait GcodeParser {
    /// Parse one line (terminator included or not) and deliver the
    /// resulting events to `handler` before returning.
    fn parse_line(&mut self, line: &str, handler: &mut dyn MachineEvents);
}
