//! StepStream Common Library
//!
//! Shared vocabulary for the StepStream workspace: axis identifiers,
//! move commands, machine configuration, and the traits that connect
//! the machine control core to its two collaborators (the G-Code
//! parser upstream, the real-time execution queue downstream).
//!
//! # Module Structure
//!
//! - [`axis`] - Axis identifiers and axis sets
//! - [`command`] - Move commands handed to the execution queue
//! - [`config`] - Machine configuration loading and validation
//! - [`error`] - Shared error types
//! - [`events`] - Parser-facing event interface
//! - [`queue`] - Execution-queue trait
//! - [`prelude`] - Common re-exports for convenience

pub mod axis;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod prelude;
pub mod queue;
