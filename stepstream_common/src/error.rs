//! Error types shared across the StepStream workspace.

use thiserror::Error;

/// Errors surfaced by the machine control layer.
#[derive(Debug, Error)]
pub enum ControlError {
    /// A machine controller is already live in this process.
    #[error("machine control already active")]
    AlreadyActive,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Execution queue error
    #[error("execution queue error: {0}")]
    Queue(#[from] QueueError),

    /// I/O error on the G-Code input stream
    #[error("input stream error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by an execution-queue backend.
#[derive(Debug, Clone, Error)]
pub enum QueueError {
    /// Access to the step-generation hardware was denied.
    #[error("insufficient privilege to access step-generation hardware")]
    PermissionDenied,

    /// Backend initialization failed
    #[error("queue initialization failed: {0}")]
    InitFailed(String),
}
