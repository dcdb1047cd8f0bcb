//! Whisper-backed speech engine
//!
//! Buffers frames through an energy VAD and transcribes whole utterances:
//! speech opens a segment, a run of silent frames (or the max length) closes
//! it, and the closed segment goes through whisper in one shot. Emits final
//! events only; partials would cost a transcription pass per frame.

use std::path::Path;

use transcribe_rs::{
    TranscriptionEngine,
    engines::whisper::{WhisperEngine, WhisperInferenceParams},
};

use crate::engine::{AudioFrame, SAMPLE_RATE, SpeechEngine, TranscriptEvent};
use crate::error::RecognitionError;
use crate::vad::EnergyVad;

/// Shortest utterance worth transcribing: half a second.
const MIN_UTTERANCE_SAMPLES: usize = SAMPLE_RATE / 2;

#[derive(Debug, Clone, Copy)]
pub struct SegmenterConfig {
    /// Silence run that closes an utterance.
    pub silence_ms: u32,
    /// Hard cap on utterance length.
    pub max_utterance_secs: u32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            silence_ms: 500,
            max_utterance_secs: 30,
        }
    }
}

/// Utterance boundary detection, separate from the engine so it can be
/// exercised without loading a model.
struct Segmenter {
    vad: EnergyVad,
    config: SegmenterConfig,
    speech: Vec<f32>,
    in_speech: bool,
    silence_frames: u32,
}

impl Segmenter {
    fn new(config: SegmenterConfig) -> Self {
        Self {
            vad: EnergyVad::new(),
            config,
            speech: Vec::new(),
            in_speech: false,
            silence_frames: 0,
        }
    }

    fn silence_frames_to_end(&self, frame_samples: usize) -> u32 {
        if frame_samples == 0 {
            return 1;
        }
        ((self.config.silence_ms as usize * SAMPLE_RATE) / (1000 * frame_samples)).max(1) as u32
    }

    fn max_samples(&self) -> usize {
        self.config.max_utterance_secs as usize * SAMPLE_RATE
    }

    /// Feed one frame; returns a closed utterance when this frame ends one.
    /// Too-short utterances are discarded, not returned.
    fn push_frame(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        let is_speech = self.vad.is_speech(samples, self.in_speech);

        if is_speech {
            self.in_speech = true;
            self.silence_frames = 0;
            self.speech.extend_from_slice(samples);
        } else if self.in_speech {
            self.silence_frames += 1;
            self.speech.extend_from_slice(samples);
        } else {
            return None;
        }

        let boundary = self.silence_frames >= self.silence_frames_to_end(samples.len())
            || self.speech.len() >= self.max_samples();
        if !boundary {
            return None;
        }

        self.in_speech = false;
        self.silence_frames = 0;
        let utterance = std::mem::take(&mut self.speech);
        if utterance.len() < MIN_UTTERANCE_SAMPLES {
            return None;
        }
        Some(utterance)
    }
}

pub struct WhisperTranscriber {
    engine: WhisperEngine,
    segmenter: Segmenter,
    language: Option<String>,
}

impl WhisperTranscriber {
    pub fn new(
        model_path: impl AsRef<Path>,
        language: Option<String>,
        config: SegmenterConfig,
    ) -> Result<Self, RecognitionError> {
        let mut engine = WhisperEngine::new();
        tracing::info!(model = %model_path.as_ref().display(), "loading whisper model");
        engine
            .load_model(model_path.as_ref())
            .map_err(|e| RecognitionError(e.to_string()))?;
        tracing::info!("whisper model loaded");

        Ok(Self {
            engine,
            segmenter: Segmenter::new(config),
            language,
        })
    }

    #[hotpath::measure]
    fn transcribe(&mut self, samples: Vec<f32>) -> Result<String, RecognitionError> {
        let params = self.language.as_ref().map(|lang| WhisperInferenceParams {
            language: Some(lang.clone()),
            ..Default::default()
        });
        let result = self
            .engine
            .transcribe_samples(samples, params)
            .map_err(|e| RecognitionError(e.to_string()))?;
        Ok(result.text.trim().to_string())
    }
}

impl SpeechEngine for WhisperTranscriber {
    fn accept_frame(
        &mut self,
        frame: &AudioFrame,
    ) -> Result<Vec<TranscriptEvent>, RecognitionError> {
        let Some(utterance) = self.segmenter.push_frame(&frame.samples) else {
            return Ok(Vec::new());
        };

        let duration = utterance.len() as f32 / SAMPLE_RATE as f32;
        let text = self.transcribe(utterance)?;
        if text.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(duration, text = %text, "utterance transcribed");
        Ok(vec![TranscriptEvent::final_text(text)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: usize = 480; // 30 ms

    fn loud() -> Vec<f32> {
        vec![0.5; FRAME]
    }

    fn silent() -> Vec<f32> {
        vec![0.0; FRAME]
    }

    #[test]
    fn test_segment_closes_after_silence_run() {
        let mut seg = Segmenter::new(SegmenterConfig {
            silence_ms: 120, // 4 frames of 30 ms
            max_utterance_secs: 30,
        });

        // One second of speech, then silence.
        for _ in 0..33 {
            assert!(seg.push_frame(&loud()).is_none());
        }
        for _ in 0..3 {
            assert!(seg.push_frame(&silent()).is_none());
        }
        let utterance = seg.push_frame(&silent()).expect("fourth silent frame closes");
        // Speech plus the trailing silence, all of it above the minimum.
        assert_eq!(utterance.len(), 37 * FRAME);

        // Segmenter is reset afterwards.
        assert!(seg.push_frame(&silent()).is_none());
    }

    #[test]
    fn test_short_blip_is_discarded() {
        let mut seg = Segmenter::new(SegmenterConfig {
            silence_ms: 120,
            max_utterance_secs: 30,
        });

        // A couple of loud frames is under the half-second minimum.
        for _ in 0..2 {
            assert!(seg.push_frame(&loud()).is_none());
        }
        for _ in 0..4 {
            assert!(seg.push_frame(&silent()).is_none());
        }
        // Nothing surfaces later either.
        assert!(seg.push_frame(&silent()).is_none());
    }

    #[test]
    fn test_max_length_forces_boundary() {
        let mut seg = Segmenter::new(SegmenterConfig {
            silence_ms: 500,
            max_utterance_secs: 1,
        });

        let mut closed = None;
        for _ in 0..40 {
            if let Some(utterance) = seg.push_frame(&loud()) {
                closed = Some(utterance);
                break;
            }
        }
        let utterance = closed.expect("cap forces a boundary without silence");
        assert!(utterance.len() >= SAMPLE_RATE);
    }

    #[test]
    fn test_leading_silence_is_not_buffered() {
        let mut seg = Segmenter::new(SegmenterConfig::default());
        for _ in 0..100 {
            assert!(seg.push_frame(&silent()).is_none());
        }
        assert!(seg.speech.is_empty());
    }
}
