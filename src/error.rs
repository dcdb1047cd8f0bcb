//! Error taxonomy for the recognition pipeline
//!
//! Only `PipelineError::Device` is fatal: the loop cannot continue without a
//! working frame source, and re-acquiring the device is the launcher's job.
//! Everything else is absorbed at the component boundary where it occurs.

use thiserror::Error;

/// Fatal pipeline errors. Anything recoverable is logged where it happens
/// and never reaches this type.
#[derive(Debug, Error, Clone)]
pub enum PipelineError {
    /// Audio capture is unavailable or the frame source went away.
    #[error("audio device error: {0}")]
    Device(String),
}

/// Speech engine failed on a frame. Recoverable: the frame produced no
/// transcript and the loop moves on.
#[derive(Debug, Error, Clone)]
#[error("recognition failed: {0}")]
pub struct RecognitionError(pub String);

/// A single action command failed to execute. Recoverable per-command;
/// the rest of the sequence still runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// No focused window to deliver the action to.
    #[error("no focused target")]
    NoTarget,

    /// Anything else the automation layer reports.
    #[error("action failed: {0}")]
    Other(String),
}
