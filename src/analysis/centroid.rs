// CentroidTracker - framewise spectral centroid curve
//
// The spectral centroid is the magnitude-weighted mean frequency of a frame:
//
//   centroid = Σ(f_k × |X[k]|) / Σ|X[k]|
//
// Heart and lung events raise the centroid relative to the surrounding
// silence, so peaks of the curve locate the cycles the segmenter cuts out.
//
// Framing: frame i is centred on sample i × hop_length (the signal is
// zero-padded by frame_size / 2 on both sides), giving
// F = ceil(len / hop_length) frames and frame_time(i) = i × hop / sample_rate.

use serde::Serialize;

use crate::analysis::fft::{FftProcessor, WindowKind};
use crate::config::CentroidConfig;
use crate::error::InputError;

/// Spectral centroid (Hz) per analysis frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentroidCurve {
    values: Vec<f32>,
    hop_length: usize,
    sample_rate: u32,
}

impl CentroidCurve {
    /// Build a curve from precomputed values
    pub fn from_values(
        values: Vec<f32>,
        hop_length: usize,
        sample_rate: u32,
    ) -> Result<Self, InputError> {
        if sample_rate == 0 {
            return Err(InputError::InvalidSampleRate { sample_rate });
        }
        if hop_length == 0 {
            return Err(InputError::InvalidFraming {
                frame_size: 0,
                hop_length,
            });
        }
        Ok(Self {
            values,
            hop_length,
            sample_rate,
        })
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Time in seconds of frame `index`
    pub fn frame_time(&self, index: usize) -> f64 {
        (index * self.hop_length) as f64 / self.sample_rate as f64
    }
}

/// Computes centroid curves with a fixed frame size and hop
pub struct CentroidTracker {
    fft: FftProcessor,
    frame_size: usize,
    hop_length: usize,
}

impl CentroidTracker {
    /// Create a tracker
    ///
    /// # Arguments
    /// * `frame_size` - FFT frame in samples (default 1024)
    /// * `hop_length` - distance between frame centres (default 512)
    pub fn new(frame_size: usize, hop_length: usize) -> Result<Self, InputError> {
        if frame_size == 0 || hop_length == 0 {
            return Err(InputError::InvalidFraming {
                frame_size,
                hop_length,
            });
        }

        Ok(Self {
            fft: FftProcessor::new(frame_size, frame_size, WindowKind::Hann),
            frame_size,
            hop_length,
        })
    }

    pub fn from_config(config: &CentroidConfig) -> Result<Self, InputError> {
        Self::new(config.frame_size, config.hop_length)
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Compute the centroid curve of `samples`
    ///
    /// Fails when the signal is empty or the sample rate is zero.
    pub fn compute(&self, samples: &[f32], sample_rate: u32) -> Result<CentroidCurve, InputError> {
        if sample_rate == 0 {
            return Err(InputError::InvalidSampleRate { sample_rate });
        }
        if samples.is_empty() {
            return Err(InputError::EmptySignal);
        }

        let num_frames = samples.len().div_ceil(self.hop_length);
        let half = self.frame_size / 2;
        let bin_width = sample_rate as f32 / self.frame_size as f32;
        let mut frame = vec![0.0f32; self.frame_size];

        let values = (0..num_frames)
            .map(|index| {
                let centre = index * self.hop_length;
                fill_centred_frame(&mut frame, samples, centre, half);
                let spectrum = self.fft.magnitude_spectrum(&frame);
                spectral_centroid(&spectrum, bin_width)
            })
            .collect();

        CentroidCurve::from_values(values, self.hop_length, sample_rate)
    }
}

/// Copy the samples around `centre` into `frame`, zero-padding outside the signal
fn fill_centred_frame(frame: &mut [f32], samples: &[f32], centre: usize, half: usize) {
    frame.fill(0.0);
    let start = centre as isize - half as isize;
    for (offset, slot) in frame.iter_mut().enumerate() {
        let idx = start + offset as isize;
        if idx >= 0 && (idx as usize) < samples.len() {
            *slot = samples[idx as usize];
        }
    }
}

/// Magnitude-weighted mean frequency, 0 for a silent frame
fn spectral_centroid(spectrum: &[f32], bin_width: f32) -> f32 {
    let weighted_sum: f32 = spectrum
        .iter()
        .enumerate()
        .map(|(i, &mag)| i as f32 * bin_width * mag)
        .sum();
    let magnitude_sum: f32 = spectrum.iter().sum();

    if magnitude_sum > 1e-10 {
        weighted_sum / magnitude_sum
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sine_wave;

    #[test]
    fn test_frame_count_is_ceil() {
        let tracker = CentroidTracker::new(1024, 512).unwrap();

        let curve = tracker.compute(&vec![0.1; 4096], 4000).unwrap();
        assert_eq!(curve.len(), 8);

        let curve = tracker.compute(&vec![0.1; 4097], 4000).unwrap();
        assert_eq!(curve.len(), 9);

        let curve = tracker.compute(&[0.1], 4000).unwrap();
        assert_eq!(curve.len(), 1);
    }

    #[test]
    fn test_frame_time_mapping() {
        let tracker = CentroidTracker::new(1024, 512).unwrap();
        let curve = tracker.compute(&vec![0.0; 40_000], 4000).unwrap();

        assert_eq!(curve.frame_time(0), 0.0);
        assert!((curve.frame_time(10) - 1.28).abs() < 1e-12);
    }

    #[test]
    fn test_silence_is_zero() {
        let tracker = CentroidTracker::new(1024, 512).unwrap();
        let curve = tracker.compute(&vec![0.0; 8000], 4000).unwrap();
        assert!(curve.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_centroid_tracks_tone_frequency() {
        let tracker = CentroidTracker::new(1024, 512).unwrap();
        let low = tracker.compute(&sine_wave(4000, 200.0, 8000, 0.8), 4000).unwrap();
        let high = tracker.compute(&sine_wave(4000, 1200.0, 8000, 0.8), 4000).unwrap();

        // Compare interior frames (edge frames are half zero-padded)
        let mid = low.len() / 2;
        assert!(
            (low.values()[mid] - 200.0).abs() < 60.0,
            "200 Hz tone centroid was {}",
            low.values()[mid]
        );
        assert!(
            (high.values()[mid] - 1200.0).abs() < 60.0,
            "1200 Hz tone centroid was {}",
            high.values()[mid]
        );
        assert!(curve_is_non_negative(&low) && curve_is_non_negative(&high));
    }

    #[test]
    fn test_deterministic() {
        let tracker = CentroidTracker::new(256, 128).unwrap();
        let signal = sine_wave(4000, 440.0, 3000, 0.5);
        assert_eq!(
            tracker.compute(&signal, 4000).unwrap(),
            tracker.compute(&signal, 4000).unwrap()
        );
    }

    #[test]
    fn test_invalid_inputs() {
        let tracker = CentroidTracker::new(1024, 512).unwrap();
        assert_eq!(tracker.compute(&[], 4000), Err(InputError::EmptySignal));
        assert_eq!(
            tracker.compute(&[0.0; 10], 0),
            Err(InputError::InvalidSampleRate { sample_rate: 0 })
        );
        assert!(matches!(
            CentroidTracker::new(1024, 0),
            Err(InputError::InvalidFraming { .. })
        ));
    }

    fn curve_is_non_negative(curve: &CentroidCurve) -> bool {
        curve.values().iter().all(|&v| v >= 0.0)
    }
}
