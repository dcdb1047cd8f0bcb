//! Microphone capture
//!
//! Owns the cpal stream on a dedicated thread: mixes down to mono, resamples
//! to 16 kHz, slices into fixed frames with sequence indices, and pushes them
//! to the recognition loop's channel. A device failure is terminal: the
//! thread returns, the stream (and the channel sender with it) drops, and the
//! recognition loop observes the disconnect. Re-acquiring the device is the
//! launcher's job, not ours.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use flume::Sender;
use tracing::info;

use crate::engine::{AudioFrame, SAMPLE_RATE};
use crate::error::PipelineError;

/// Linear resampler. Good enough for speech; the engine is tolerant.
pub fn resample(samples: &[f32], from_rate: usize, to_rate: usize) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }
    let ratio = to_rate as f64 / from_rate as f64;
    let new_len = (samples.len() as f64 * ratio) as usize;
    (0..new_len)
        .map(|i| {
            let src_idx = i as f64 / ratio;
            let idx = src_idx as usize;
            let frac = src_idx - idx as f64;
            if idx + 1 < samples.len() {
                samples[idx] * (1.0 - frac as f32) + samples[idx + 1] * frac as f32
            } else {
                samples.get(idx).copied().unwrap_or(0.0)
            }
        })
        .collect()
}

/// Capture until `running` drops or the device fails. Blocks the calling
/// thread; spawn it.
pub fn run_capture(
    tx: Sender<AudioFrame>,
    running: Arc<AtomicBool>,
    frame_samples: usize,
) -> Result<(), PipelineError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| PipelineError::Device("no input device".into()))?;
    let supported = device
        .default_input_config()
        .map_err(|e| PipelineError::Device(e.to_string()))?;
    let sample_rate = u32::from(supported.sample_rate()) as usize;
    let channels = supported.channels() as usize;

    info!(sample_rate, channels, target = SAMPLE_RATE, "microphone opened");

    let failure: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let failure_cb = Arc::clone(&failure);

    let mut pending: Vec<f32> = Vec::with_capacity(frame_samples * 2);
    let mut seq: u64 = 0;

    let stream = device
        .build_input_stream(
            &supported.config(),
            move |data: &[f32], _| {
                let mono: Vec<f32> = if channels == 1 {
                    data.to_vec()
                } else {
                    data.chunks(channels)
                        .map(|c| c.iter().sum::<f32>() / channels as f32)
                        .collect()
                };
                pending.extend_from_slice(&resample(&mono, sample_rate, SAMPLE_RATE));

                while pending.len() >= frame_samples {
                    let samples: Vec<f32> = pending.drain(..frame_samples).collect();
                    let _ = tx.send(AudioFrame::new(seq, samples));
                    seq += 1;
                }
            },
            move |e| {
                *failure_cb.lock().unwrap() = Some(e.to_string());
            },
            None,
        )
        .map_err(|e| PipelineError::Device(e.to_string()))?;
    stream
        .play()
        .map_err(|e| PipelineError::Device(e.to_string()))?;

    while running.load(Ordering::SeqCst) {
        if let Some(msg) = failure.lock().unwrap().take() {
            return Err(PipelineError::Device(msg));
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    Ok(())
}
