// GFCC - gammatone frequency cepstral coefficients
//
// Per segment:
// 1. pre-emphasis y[n] = x[n] - a × x[n-1]
// 2. 25 ms frames every 10 ms (zero-padded tail), symmetric Hamming window
// 3. power spectrum |X|^2 / N from an N-point FFT
// 4. gammatone band energies, cube-root compressed
// 5. orthonormal DCT-II, first `num_coeffs` coefficients
// 6. mean over frames

use std::f32::consts::PI;

use crate::analysis::features::gammatone::GammatoneFilterbank;
use crate::analysis::features::{FeatureTransform, FeatureVector};
use crate::analysis::fft::{FftProcessor, WindowKind};
use crate::config::FeatureConfig;
use crate::error::PipelineError;

/// Default feature transform
pub struct GfccExtractor {
    fft: FftProcessor,
    filterbank: GammatoneFilterbank,
    /// `dct[k][m]`, `num_coeffs × num_filters`
    dct: Vec<Vec<f32>>,
    frame_len: usize,
    frame_hop: usize,
    pre_emphasis: f32,
    sample_rate: u32,
}

impl GfccExtractor {
    /// Build the extractor for recordings at `sample_rate`
    ///
    /// Fails when the frame, filter or coefficient counts are inconsistent.
    pub fn new(config: &FeatureConfig, sample_rate: u32) -> Result<Self, PipelineError> {
        let invalid = |reason: String| PipelineError::Extraction { reason };

        if sample_rate == 0 {
            return Err(invalid("sample rate must be greater than 0".to_string()));
        }
        if config.num_filters == 0 || config.num_coeffs == 0 {
            return Err(invalid("filter and coefficient counts must be positive".to_string()));
        }
        if config.num_coeffs > config.num_filters {
            return Err(invalid(format!(
                "{} coefficients requested from {} filters",
                config.num_coeffs, config.num_filters
            )));
        }

        let frame_len = (config.frame_length_s * sample_rate as f64).round() as usize;
        let frame_hop = (config.frame_hop_s * sample_rate as f64).round() as usize;
        if frame_len == 0 || frame_hop == 0 {
            return Err(invalid(format!(
                "frame of {}s / hop of {}s is empty at {} Hz",
                config.frame_length_s, config.frame_hop_s, sample_rate
            )));
        }
        if config.fft_size < frame_len {
            return Err(invalid(format!(
                "FFT size {} is shorter than the {}-sample frame",
                config.fft_size, frame_len
            )));
        }

        let nyquist = sample_rate as f32 / 2.0;
        let high_hz = config.high_freq_hz.unwrap_or(nyquist).min(nyquist);

        Ok(Self {
            fft: FftProcessor::new(config.fft_size, frame_len, WindowKind::Hamming),
            filterbank: GammatoneFilterbank::new(
                config.num_filters,
                config.fft_size,
                sample_rate,
                config.low_freq_hz,
                high_hz,
            ),
            dct: dct_matrix(config.num_coeffs, config.num_filters),
            frame_len,
            frame_hop,
            pre_emphasis: config.pre_emphasis,
            sample_rate,
        })
    }

    /// Cepstrum of every frame of `samples`
    pub fn frame_cepstra(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        let emphasized = pre_emphasize(samples, self.pre_emphasis);
        let num_frames = if emphasized.len() <= self.frame_len {
            1
        } else {
            1 + (emphasized.len() - self.frame_len).div_ceil(self.frame_hop)
        };

        let mut frame = vec![0.0f32; self.frame_len];
        (0..num_frames)
            .map(|index| {
                let start = index * self.frame_hop;
                frame.fill(0.0);
                if start < emphasized.len() {
                    let end = (start + self.frame_len).min(emphasized.len());
                    frame[..end - start].copy_from_slice(&emphasized[start..end]);
                }

                let power = self.fft.power_spectrum(&frame);
                let compressed: Vec<f32> = self
                    .filterbank
                    .apply(&power)
                    .into_iter()
                    .map(f32::cbrt)
                    .collect();
                self.dct
                    .iter()
                    .map(|basis| basis.iter().zip(&compressed).map(|(b, e)| b * e).sum())
                    .collect()
            })
            .collect()
    }
}

impl FeatureTransform for GfccExtractor {
    fn dimension(&self) -> usize {
        self.dct.len()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn transform(&self, samples: &[f32]) -> Result<FeatureVector, PipelineError> {
        let cepstra = self.frame_cepstra(samples);
        let mut mean = vec![0.0f32; self.dimension()];
        for frame in &cepstra {
            for (acc, value) in mean.iter_mut().zip(frame) {
                *acc += value;
            }
        }
        let count = cepstra.len().max(1) as f32;
        mean.iter_mut().for_each(|acc| *acc /= count);

        Ok(FeatureVector::new(mean))
    }
}

fn pre_emphasize(samples: &[f32], coefficient: f32) -> Vec<f32> {
    if coefficient == 0.0 {
        return samples.to_vec();
    }
    let mut out = Vec::with_capacity(samples.len());
    let mut previous = 0.0f32;
    for (i, &sample) in samples.iter().enumerate() {
        out.push(if i == 0 { sample } else { sample - coefficient * previous });
        previous = sample;
    }
    out
}

/// Orthonormal DCT-II basis, `rows × size`
fn dct_matrix(rows: usize, size: usize) -> Vec<Vec<f32>> {
    let n = size as f32;
    (0..rows)
        .map(|k| {
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            (0..size)
                .map(|m| scale * (PI * k as f32 * (2.0 * m as f32 + 1.0) / (2.0 * n)).cos())
                .collect()
        })
        .collect()
}
