//! Speech engine boundary
//!
//! The pipeline treats recognition as an opaque capability: frames in,
//! transcript events out. Engines never emit a final event for audio they
//! have not consumed. Alternate engines (including deterministic fakes for
//! tests) plug in through [`SpeechEngine`].

use crate::error::RecognitionError;

/// Sample rate every frame carries: 16 kHz mono f32 PCM.
pub const SAMPLE_RATE: usize = 16000;

/// One fixed-size chunk of microphone audio with its sequence index.
/// Owned transiently by the recognition loop and dropped after the engine
/// has seen it.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub seq: u64,
    pub samples: Vec<f32>,
}

impl AudioFrame {
    pub fn new(seq: u64, samples: Vec<f32>) -> Self {
        Self { seq, samples }
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / SAMPLE_RATE as f32
    }
}

/// A unit of recognized text, partial or final. Partials may be superseded;
/// only finals reach the command mapper.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEvent {
    pub text: String,
    pub is_final: bool,
    pub confidence: Option<f32>,
}

impl TranscriptEvent {
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
            confidence: None,
        }
    }

    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
            confidence: None,
        }
    }
}

/// Recognition capability: consume one frame, produce zero or more events.
/// Audio an engine has buffered but not finalized when the process stops is
/// simply dropped: stale speech must never be typed later.
pub trait SpeechEngine: Send {
    /// Feed one frame. A failure means "no transcript for this frame";
    /// the caller logs it and keeps going.
    fn accept_frame(&mut self, frame: &AudioFrame)
    -> Result<Vec<TranscriptEvent>, RecognitionError>;
}
