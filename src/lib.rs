//! voxkey: hands-free dictation
//!
//! Turns a continuous microphone stream into typed text and discrete system
//! actions (punctuation, editing, window control), with a single thread-safe
//! ON/OFF toggle that any number of control surfaces can drive.
//!
//! The pipeline: capture thread -> recognition loop -> speech engine ->
//! command mapper -> action executor. Engines and executors are capability
//! traits so tests (and alternate backends) substitute deterministic fakes.

pub mod actions;
#[cfg(feature = "audio-io")]
pub mod capture;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod executor;
#[cfg(feature = "hotkey")]
pub mod hotkey;
pub mod keymap;
pub mod lexicon;
pub mod mapper;
pub mod recognition;
#[cfg(feature = "whisper")]
pub mod transcriber;
pub mod vad;

pub use actions::{ActionCommand, Key, KeyChord, Modifier, MouseButton, ScrollDirection};
pub use controller::{ListenState, SubscriptionId, ToggleController};
pub use engine::{AudioFrame, SAMPLE_RATE, SpeechEngine, TranscriptEvent};
pub use error::{ExecutionError, PipelineError, RecognitionError};
pub use executor::{ActionExecutor, DryRunExecutor, InputMethod};
pub use lexicon::{CommandToken, EditKind, Lexicon, SystemKind};
pub use mapper::{CommandMapper, ControlRequest, MapOutcome};
pub use recognition::RecognitionLoop;
