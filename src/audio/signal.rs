// Signal - immutable mono sample sequence at a known rate

use crate::error::InputError;

/// Mono recording at a fixed sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Signal {
    /// Wrap decoded samples
    ///
    /// Fails when there are no samples or the rate is zero.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, InputError> {
        if sample_rate == 0 {
            return Err(InputError::InvalidSampleRate { sample_rate });
        }
        if samples.is_empty() {
            return Err(InputError::EmptySignal);
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    #[cfg(test)]
    pub(crate) fn new_unchecked(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds (`len / sample_rate`)
    pub fn duration_s(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Samples in `[floor(start_s * sr), floor(end_s * sr))`, clamped to the signal
    pub fn slice_seconds(&self, start_s: f64, end_s: f64) -> &[f32] {
        let sr = self.sample_rate as f64;
        let start = ((start_s.max(0.0) * sr).floor() as usize).min(self.samples.len());
        let end = ((end_s.max(0.0) * sr).floor() as usize).min(self.samples.len());
        if end <= start {
            return &[];
        }
        &self.samples[start..end]
    }
}
