//! `MachineController` lifecycle and the streaming session loop.
//!
//! The controller is the single owner of machine state. Construction
//! claims a process-wide slot (at most one controller may be live at a
//! time), initializes the execution queue unless dry-run is requested,
//! and seeds the sticky feedrate. `stream()` runs one line-at-a-time
//! session; `shutdown()` consumes the controller and tears the queue
//! down gracefully or forcibly depending on whether an interrupt was
//! observed.

use crate::shutdown::ShutdownToken;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use stepstream_common::axis::{Axis, AXIS_COUNT};
use stepstream_common::config::MachineConfig;
use stepstream_common::error::ControlError;
use stepstream_common::events::GcodeParser;
use stepstream_common::queue::MotionQueue;
use tracing::{info, warn};

/// How one streaming session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The input source reached end of stream.
    Completed,
    /// Shutdown was requested; the session stopped at a line boundary.
    Interrupted,
}

static CONTROL_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Exclusive right to be the machine controller of this process.
/// Released when dropped.
struct ActiveClaim;

impl ActiveClaim {
    fn acquire() -> Result<Self, ControlError> {
        if CONTROL_ACTIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ControlError::AlreadyActive);
        }
        Ok(Self)
    }
}

impl Drop for ActiveClaim {
    fn drop(&mut self) {
        CONTROL_ACTIVE.store(false, Ordering::SeqCst);
    }
}

/// Owner of machine state; bridge from parser events to the execution
/// queue.
pub struct MachineController {
    pub(crate) cfg: MachineConfig,
    pub(crate) queue: Box<dyn MotionQueue>,
    /// Absolute position per axis in steps — the sole source of truth
    /// for where the machine currently is.
    pub(crate) position_steps: [i32; AXIS_COUNT],
    /// Last nonzero feedrate requested by a coordinated move [mm/s].
    pub(crate) current_feedrate: f64,
    /// Program speed override (M220), 1.0 = 100%.
    pub(crate) prog_speed_factor: f64,
    /// Diagnostic channel of the active session, if any. Flushed after
    /// every write so status lines survive an abrupt shutdown.
    pub(crate) sink: Option<Box<dyn Write>>,
    token: ShutdownToken,
    /// Latched once any session observed the shutdown request.
    interrupted: bool,
    _claim: ActiveClaim,
}

impl MachineController {
    /// Build the controller and prepare the execution queue.
    ///
    /// Fails if another controller is live in this process, if the
    /// configuration is invalid, or if queue initialization fails
    /// (e.g. insufficient privilege for hardware access). Dry-run
    /// bypasses the queue entirely. No partial state survives a
    /// failure.
    pub fn new(
        config: MachineConfig,
        mut queue: Box<dyn MotionQueue>,
    ) -> Result<Self, ControlError> {
        let claim = ActiveClaim::acquire()?;
        config.validate()?;

        if !config.dry_run {
            let steps_per_mm = config.steps_per_mm[Axis::X.index()];
            queue.init(config.machine_acceleration() * steps_per_mm)?;
        }

        info!(
            "Machine control ready (max {} mm/s{}{})",
            config.machine_max_feedrate(),
            if config.dry_run { ", dry-run" } else { "" },
            if config.synchronous {
                ", synchronous"
            } else {
                ""
            },
        );

        Ok(Self {
            current_feedrate: config.machine_max_feedrate() / 10.0,
            prog_speed_factor: 1.0,
            position_steps: [0; AXIS_COUNT],
            sink: None,
            token: ShutdownToken::new(),
            interrupted: false,
            cfg: config,
            queue,
            _claim: claim,
        })
    }

    /// The cancellation token. Hand a clone to the signal handler.
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.token.clone()
    }

    /// Current absolute position in steps per axis.
    pub fn position_steps(&self) -> [i32; AXIS_COUNT] {
        self.position_steps
    }

    /// Stream one G-Code input source to completion.
    ///
    /// Reads a line, hands it to the parser (which calls back into this
    /// controller), then polls the cancellation token — interruption
    /// takes effect at line boundaries, never mid-line. `sink` becomes
    /// the session's diagnostic channel and is flushed and released
    /// when the session ends, however it ends.
    ///
    /// May be called again after it returns; the controller keeps its
    /// machine state across sessions.
    pub fn stream(
        &mut self,
        parser: &mut dyn GcodeParser,
        input: &mut dyn BufRead,
        sink: Option<Box<dyn Write>>,
    ) -> Result<SessionOutcome, ControlError> {
        self.sink = sink;
        let mut line = String::new();
        let result = loop {
            if self.token.is_requested() {
                self.interrupted = true;
                break Ok(SessionOutcome::Interrupted);
            }
            line.clear();
            match input.read_line(&mut line) {
                Ok(0) => break Ok(SessionOutcome::Completed),
                Ok(_) => parser.parse_line(&line, self),
                Err(e) => break Err(ControlError::Io(e)),
            }
        };

        if let Some(mut sink) = self.sink.take() {
            let _ = sink.flush();
        }
        match &result {
            Ok(outcome) => info!("G-Code stream finished: {outcome:?}"),
            Err(e) => warn!("G-Code stream aborted: {e}"),
        }
        result
    }

    /// Tear down the execution queue and release the controller slot.
    ///
    /// After an observed interrupt the queue exits without draining —
    /// queued-but-unexecuted motion is abandoned in favor of prompt
    /// shutdown. Otherwise the queue drains first. Dry-run never
    /// touched the queue and does not do so here either.
    pub fn shutdown(mut self) -> Result<(), ControlError> {
        if !self.cfg.dry_run {
            if self.interrupted {
                warn!("Skipping potential remaining queue");
                self.queue.exit_forced();
            } else {
                self.queue.exit_graceful();
            }
        }
        Ok(())
    }
}
