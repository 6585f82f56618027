//! End-to-end streaming sessions: G-Code text through the parser into
//! the controller, with the diagnostic channel captured.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use stepstream_common::axis::{Axis, AXIS_COUNT};
use stepstream_common::command::MoveCommand;
use stepstream_common::config::MachineConfig;
use stepstream_common::error::QueueError;
use stepstream_common::queue::MotionQueue;
use stepstream_control::{MachineController, SessionOutcome};
use stepstream_gcode::LineParser;

static CONTROLLER_SLOT: Mutex<()> = Mutex::new(());

fn slot() -> MutexGuard<'static, ()> {
    CONTROLLER_SLOT
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct QueueLog {
    commands: Vec<MoveCommand>,
    waits: u32,
}

#[derive(Clone, Default)]
struct RecordingQueue {
    log: Arc<Mutex<QueueLog>>,
}

impl MotionQueue for RecordingQueue {
    fn init(&mut self, _acceleration: f64) -> Result<(), QueueError> {
        Ok(())
    }
    fn enqueue(&mut self, command: &MoveCommand, _sink: Option<&mut dyn Write>) {
        self.log.lock().unwrap().commands.push(*command);
    }
    fn wait_until_empty(&mut self) {
        self.log.lock().unwrap().waits += 1;
    }
    fn exit_graceful(&mut self) {}
    fn exit_forced(&mut self) {}
}

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run one session over the given program and return what the queue and
/// the diagnostic channel saw, plus the final position.
fn run_session(
    config: MachineConfig,
    program: &str,
) -> (SessionOutcome, QueueLog, String, [i32; AXIS_COUNT]) {
    let queue = RecordingQueue::default();
    let log_handle = queue.log.clone();
    let mut controller = MachineController::new(config, Box::new(queue)).unwrap();

    let sink = SharedSink::default();
    let output = sink.0.clone();

    let mut parser = LineParser::new();
    let mut input = program.as_bytes();
    let outcome = controller
        .stream(&mut parser, &mut input, Some(Box::new(sink)))
        .unwrap();

    let position = controller.position_steps();
    controller.shutdown().unwrap();

    let log = std::mem::take(&mut *log_handle.lock().unwrap());
    let text = String::from_utf8(output.lock().unwrap().clone()).unwrap();
    (outcome, log, text, position)
}

#[test]
fn full_program_streams_in_order() {
    let _guard = slot();
    let program = "\
G1 X10 Y10 F6000
M220 S50
G1 X20
M114
G4 P1
G28 X0 Y0
M84
M42
";
    let (outcome, log, text, position) = run_session(MachineConfig::default(), program);

    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(log.commands.len(), 3);

    // Diagonal move at 100 mm/s: dominant-axis scaling over the
    // euclidean step distance.
    assert_eq!(log.commands[0].step(Axis::X), 1600);
    assert_eq!(log.commands[0].step(Axis::Y), 1600);
    let expected = 16_000.0 / 2f64.sqrt();
    assert!((log.commands[0].travel_speed - expected).abs() < 1e-9);

    // Feed omitted: sticky 100 mm/s, halved by M220 S50.
    assert_eq!(log.commands[1].step(Axis::X), 1600);
    assert_eq!(log.commands[1].travel_speed, 8_000.0);

    // Homing rapid back to origin at the machine maximum.
    assert_eq!(log.commands[2].step(Axis::X), -3200);
    assert_eq!(log.commands[2].step(Axis::Y), -1600);
    assert_eq!(log.commands[2].travel_speed, 32_000.0);

    // Dwell drained the queue once.
    assert_eq!(log.waits, 1);

    // Position report reflects the pre-home position.
    assert!(text.contains("ok C: X:20.000 Y:10.000 Z0.000 E0.000"));
    assert!(text.contains("Homing requested (0x03)"));
    assert!(text.contains("disable_motors() not implemented"));
    assert!(text.contains("didn't understand ('M', 42, '')"));

    assert_eq!(position, [0; AXIS_COUNT]);
}

#[test]
fn status_inquiries_answer_on_the_diagnostic_channel() {
    let _guard = slot();
    let (outcome, log, text, _) = run_session(MachineConfig::default(), "M105\nM115\n");

    assert_eq!(outcome, SessionOutcome::Completed);
    assert!(log.commands.is_empty());
    assert!(text.contains("ok T-300"));
    assert!(text.contains("ok PROTOCOL_VERSION:0.1 FIRMWARE_NAME:StepStream"));
}

#[test]
fn negative_speed_override_means_percent_below_full() {
    let _guard = slot();
    let program = "G1 X10 F6000\nM220 S-10\nG1 X20\n";
    let (_, log, _, _) = run_session(MachineConfig::default(), program);

    // 100 mm/s sticky feed at 90%.
    assert_eq!(log.commands[1].travel_speed, 14_400.0);
}

#[test]
fn rejected_speed_override_reports_and_keeps_going() {
    let _guard = slot();
    let program = "M220 S0.1\nG1 X10 F6000\n";
    let (outcome, log, text, _) = run_session(MachineConfig::default(), program);

    assert_eq!(outcome, SessionOutcome::Completed);
    assert!(text.contains("Not accepting speed factors < 0.5%"));
    // The move still ran at the unmodified feedrate.
    assert_eq!(log.commands[0].travel_speed, 16_000.0);
}

#[test]
fn debug_print_echoes_each_move() {
    let _guard = slot();
    let mut config = MachineConfig::default();
    config.debug_print = true;
    let (_, _, text, _) = run_session(config, "G1 X10 F600\nG1 Z1\n");

    // Compact form while Z is still, full form once it moves.
    assert!(text.contains("E:0   step kHz:1.600"));
    assert!(text.contains("Z:160"));
}

#[test]
fn dry_run_session_is_observably_identical_except_for_the_queue() {
    let _guard = slot();
    let program = "G1 X10 Y4 F6000\nM114\n";

    let (_, wet_log, wet_text, wet_position) =
        run_session(MachineConfig::default(), program);

    let mut config = MachineConfig::default();
    config.dry_run = true;
    let (_, dry_log, dry_text, dry_position) = run_session(config, program);

    assert_eq!(wet_log.commands.len(), 1);
    assert!(dry_log.commands.is_empty());
    assert_eq!(dry_log.waits, 0);
    assert_eq!(wet_position, dry_position);
    assert_eq!(wet_text, dry_text);
}
