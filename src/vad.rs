//! Energy-based voice activity detection
//!
//! RMS with hysteresis: the onset threshold is higher than the sustain
//! threshold so speech is not chopped at quiet tails.

const ENERGY_THRESHOLD: f32 = 0.01;
const ENERGY_THRESHOLD_END: f32 = 0.006;

pub struct EnergyVad {
    threshold: f32,
    threshold_end: f32,
}

impl EnergyVad {
    pub fn new() -> Self {
        Self {
            threshold: ENERGY_THRESHOLD,
            threshold_end: ENERGY_THRESHOLD_END,
        }
    }

    pub fn is_speech(&self, frame: &[f32], currently_speaking: bool) -> bool {
        if frame.is_empty() {
            return false;
        }
        let threshold = if currently_speaking {
            self.threshold_end
        } else {
            self.threshold
        };
        let rms = (frame.iter().map(|&s| s * s).sum::<f32>() / frame.len() as f32).sqrt();
        rms > threshold
    }
}

impl Default for EnergyVad {
    fn default() -> Self {
        Self::new()
    }
}
