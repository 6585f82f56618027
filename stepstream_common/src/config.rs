//! Machine configuration.
//!
//! `MachineConfig` is loaded once from TOML (or built from defaults) and
//! is read-only afterwards. It carries the per-axis step resolution and
//! rate limits plus the operating-mode switches of a streaming session.

use crate::axis::{Axis, AXIS_COUNT};
use crate::error::ControlError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_steps_per_mm() -> [f64; AXIS_COUNT] {
    [160.0; AXIS_COUNT]
}

fn default_max_feedrate() -> [f64; AXIS_COUNT] {
    [200.0; AXIS_COUNT]
}

fn default_acceleration() -> [f64; AXIS_COUNT] {
    [4000.0; AXIS_COUNT]
}

fn default_speed_factor() -> f64 {
    1.0
}

fn default_motor_map() -> heapless::Vec<Axis, AXIS_COUNT> {
    let mut map = heapless::Vec::new();
    for axis in [Axis::X, Axis::Y, Axis::Z, Axis::E] {
        let _ = map.push(axis);
    }
    map
}

/// Machine configuration loaded from `machine.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Step resolution per axis [steps/mm].
    #[serde(default = "default_steps_per_mm")]
    pub steps_per_mm: [f64; AXIS_COUNT],

    /// Maximum feedrate per axis [mm/s].
    #[serde(default = "default_max_feedrate")]
    pub max_feedrate: [f64; AXIS_COUNT],

    /// Acceleration per axis [mm/s²]. Handed to the execution unit at
    /// initialization; this layer does no ramp planning itself.
    #[serde(default = "default_acceleration")]
    pub acceleration: [f64; AXIS_COUNT],

    /// Global scale applied to every requested feedrate.
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f64,

    /// Compute moves but never hand them to the execution queue.
    #[serde(default)]
    pub dry_run: bool,

    /// Drain the queue before each submit (one move in flight at a time).
    #[serde(default)]
    pub synchronous: bool,

    /// Echo each emitted move on the diagnostic channel.
    #[serde(default)]
    pub debug_print: bool,

    /// Motor output slot → axis wiring, consumed by hardware queue
    /// backends. Slot order is the physical connector order.
    #[serde(default = "default_motor_map")]
    pub motor_map: heapless::Vec<Axis, AXIS_COUNT>,
}

impl MachineConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ControlError> {
        toml::from_str(content).map_err(|e| ControlError::Config(format!("parse error: {e}")))
    }

    /// The machine-wide maximum feedrate [mm/s].
    ///
    /// Taken from the X entry; the speed model does not yet weight
    /// per-axis limits by the distance each axis travels.
    #[inline]
    pub fn machine_max_feedrate(&self) -> f64 {
        self.max_feedrate[Axis::X.index()]
    }

    /// The acceleration handed to the execution unit [mm/s²].
    /// Same X-entry convention as [`Self::machine_max_feedrate`].
    #[inline]
    pub fn machine_acceleration(&self) -> f64 {
        self.acceleration[Axis::X.index()]
    }

    /// Validate the configuration.
    ///
    /// # Validation Rules
    /// 1. `speed_factor` > 0
    /// 2. machine maximum feedrate and acceleration > 0
    /// 3. `steps_per_mm` > 0 for every axis that gets divided or
    ///    multiplied by it: X/Y (speed scaling), Z/E (position report),
    ///    and every axis wired to a motor output
    /// 4. no axis wired to two motor outputs
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.speed_factor <= 0.0 {
            return Err(ControlError::Config(format!(
                "speed_factor must be > 0 (got {})",
                self.speed_factor
            )));
        }

        if self.machine_max_feedrate() <= 0.0 {
            return Err(ControlError::Config(format!(
                "max_feedrate must be > 0 (got {})",
                self.machine_max_feedrate()
            )));
        }

        if self.machine_acceleration() <= 0.0 {
            return Err(ControlError::Config(format!(
                "acceleration must be > 0 (got {})",
                self.machine_acceleration()
            )));
        }

        let mut required = [Axis::X, Axis::Y, Axis::Z, Axis::E].to_vec();
        required.extend(self.motor_map.iter().copied());
        for axis in required {
            if self.steps_per_mm[axis.index()] <= 0.0 {
                return Err(ControlError::Config(format!(
                    "steps_per_mm[{}] must be > 0 (got {})",
                    axis.letter(),
                    self.steps_per_mm[axis.index()]
                )));
            }
        }

        let mut seen = [false; AXIS_COUNT];
        for axis in self.motor_map.iter() {
            if seen[axis.index()] {
                return Err(ControlError::Config(format!(
                    "axis {} wired to more than one motor output",
                    axis.letter()
                )));
            }
            seen[axis.index()] = true;
        }

        Ok(())
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            steps_per_mm: default_steps_per_mm(),
            max_feedrate: default_max_feedrate(),
            acceleration: default_acceleration(),
            speed_factor: 1.0,
            dry_run: false,
            synchronous: false,
            debug_print: false,
            motor_map: default_motor_map(),
        }
    }
}

/// Load a machine configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MachineConfig, ControlError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ControlError::Config(format!("failed to read {path:?}: {e}")))?;
    MachineConfig::from_toml(&content)
}
