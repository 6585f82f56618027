//! StepStream G-Code Parser
//!
//! Line-oriented G-Code front end for the machine control core. The
//! parser owns the *real-world* coordinate state (units, absolute vs
//! relative mode, G92 offsets, last commanded position in millimeters)
//! and delivers fully normalized events through
//! [`stepstream_common::events::MachineEvents`]; the control layer on
//! the other side of that trait owns the *machine* coordinate state in
//! steps.
//!
//! Words the parser does not understand are forwarded verbatim to the
//! event handler's catch-all, which keeps status inquiries (M105, M114,
//! M115, ...) out of the parser entirely.

pub mod parser;

pub use parser::LineParser;
