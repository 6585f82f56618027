//! # StepStream host binary
//!
//! Streams G-Code from a file, stdin, or a TCP connection into the
//! machine control core, backed by the simulation execution queue.
//!
//! # Usage
//!
//! ```bash
//! # Stream a file, echoing every move
//! stepstream_control -P part.gcode
//!
//! # Dry run from stdin with a config file
//! stepstream_control --config machine.toml -n < part.gcode
//!
//! # Serve interactive clients, one at a time
//! stepstream_control -p 4000 -v
//! ```

#![deny(warnings)]

use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::Duration;
use stepstream_common::config::{load_config, MachineConfig};
use stepstream_control::{MachineController, SessionOutcome, SimQueue};
use stepstream_gcode::LineParser;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// StepStream - stream G-Code into stepper move requests
#[derive(Parser, Debug)]
#[command(name = "stepstream_control")]
#[command(version)]
#[command(about = "Translate a G-Code stream into stepper move requests for a real-time execution queue")]
#[command(long_about = None)]
struct Args {
    /// Path to machine configuration TOML. Built-in defaults when
    /// omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Dry run: compute all motion but never touch the execution queue.
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Drain the queue before each submit (one move in flight at a time).
    #[arg(long)]
    sync: bool,

    /// Echo each emitted move on the diagnostic channel.
    #[arg(short = 'P', long)]
    print_moves: bool,

    /// Listen on this TCP port and stream one connection at a time
    /// instead of reading a file.
    #[arg(short = 'p', long, value_name = "PORT")]
    port: Option<u16>,

    /// G-Code input file ("-" or omitted reads stdin).
    gcode: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("StepStream v{} starting...", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(SessionOutcome::Completed) => {
            info!("StepStream shutdown complete");
        }
        Ok(SessionOutcome::Interrupted) => {
            warn!("Interrupted by operator");
            process::exit(2);
        }
        Err(e) => {
            error!("FATAL: {e}");
            process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<SessionOutcome, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path)?
        }
        None => MachineConfig::default(),
    };
    config.dry_run |= args.dry_run;
    config.synchronous |= args.sync;
    config.debug_print |= args.print_moves;

    let mut controller = MachineController::new(config, Box::new(SimQueue::new()))?;

    let token = controller.shutdown_token();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        token.request();
    })?;

    let mut parser = LineParser::new();
    let outcome = match args.port {
        Some(port) => serve(&mut controller, &mut parser, port)?,
        None => stream_path(&mut controller, &mut parser, args.gcode.as_ref())?,
    };

    controller.shutdown()?;
    Ok(outcome)
}

/// Stream one file (or stdin) to completion, diagnostics to stdout.
fn stream_path(
    controller: &mut MachineController,
    parser: &mut LineParser,
    path: Option<&PathBuf>,
) -> Result<SessionOutcome, Box<dyn std::error::Error>> {
    let sink: Option<Box<dyn Write>> = Some(Box::new(io::stdout()));
    let outcome = match path {
        Some(p) if p.as_os_str() != "-" => {
            info!("Streaming G-Code from {:?}", p);
            let mut reader = BufReader::new(File::open(p)?);
            controller.stream(parser, &mut reader, sink)?
        }
        _ => {
            info!("Streaming G-Code from stdin");
            let mut reader = io::stdin().lock();
            controller.stream(parser, &mut reader, sink)?
        }
    };
    Ok(outcome)
}

/// Accept TCP clients one at a time; each connection is one streaming
/// session with diagnostics answered over the same socket.
fn serve(
    controller: &mut MachineController,
    parser: &mut LineParser,
    port: u16,
) -> Result<SessionOutcome, Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    // Non-blocking accept so the shutdown token stays responsive while
    // idle.
    listener.set_nonblocking(true)?;
    let token = controller.shutdown_token();
    info!("Listening for G-Code on port {port}");

    loop {
        if token.is_requested() {
            return Ok(SessionOutcome::Interrupted);
        }
        match listener.accept() {
            Ok((stream, peer)) => {
                info!("Client {peer} connected");
                stream.set_nonblocking(false)?;
                let mut reader = BufReader::new(stream.try_clone()?);
                let sink: Option<Box<dyn Write>> = Some(Box::new(stream));
                let outcome = controller.stream(parser, &mut reader, sink)?;
                if outcome == SessionOutcome::Interrupted {
                    return Ok(outcome);
                }
                info!("Client {peer} disconnected");
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(100));
            }
            Err(e) => return Err(Box::new(e)),
        }
    }
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
