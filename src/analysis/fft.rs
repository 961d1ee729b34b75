// FFT module - windowed spectrum computation
//
// This module handles FFT computation with proper windowing to reduce
// spectral leakage. The centroid tracker consumes magnitude spectra and the
// cepstral extractor consumes power spectra.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Analysis window applied before the FFT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// Periodic Hann window (spectral centroid frames)
    Hann,
    /// Symmetric Hamming window (cepstral frames)
    Hamming,
}

impl WindowKind {
    fn coefficients(self, len: usize) -> Vec<f32> {
        use std::f32::consts::PI;

        match self {
            WindowKind::Hann => (0..len)
                .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f32) / len as f32).cos())
                .collect(),
            WindowKind::Hamming if len == 1 => vec![1.0],
            WindowKind::Hamming => (0..len)
                .map(|i| 0.54 - 0.46 * ((2.0 * PI * i as f32) / (len as f32 - 1.0)).cos())
                .collect(),
        }
    }
}

/// FFT processor that computes one-sided spectra from audio frames
///
/// The FFT plan is created once; the processor is `Send + Sync` so a single
/// instance can serve concurrent requests.
pub struct FftProcessor {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    /// Pre-computed window, `window.len() <= fft_size`
    window: Vec<f32>,
}

impl FftProcessor {
    /// Create a new FFT processor
    ///
    /// # Arguments
    /// * `fft_size` - FFT length (frames are zero-padded up to it)
    /// * `window_len` - number of samples windowed per frame (clamped to `fft_size`)
    /// * `kind` - window shape
    pub fn new(fft_size: usize, window_len: usize, kind: WindowKind) -> Self {
        let fft_size = fft_size.max(1);
        let window_len = window_len.clamp(1, fft_size);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_size);

        Self {
            fft,
            fft_size,
            window: kind.coefficients(window_len),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Number of bins in a one-sided spectrum
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Compute magnitude spectrum `|X[k]|`
    ///
    /// Samples beyond the window length are ignored; shorter frames are zero-padded.
    pub fn magnitude_spectrum(&self, frame: &[f32]) -> Vec<f32> {
        self.transform(frame).iter().map(|c| c.norm()).collect()
    }

    /// Compute power spectrum `|X[k]|^2 / fft_size`
    pub fn power_spectrum(&self, frame: &[f32]) -> Vec<f32> {
        let scale = 1.0 / self.fft_size as f32;
        self.transform(frame)
            .iter()
            .map(|c| c.norm_sqr() * scale)
            .collect()
    }

    fn transform(&self, frame: &[f32]) -> Vec<Complex<f32>> {
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.fft_size];
        for (slot, (&sample, &w)) in buffer.iter_mut().zip(frame.iter().zip(&self.window)) {
            slot.re = sample * w;
        }

        self.fft.process(&mut buffer);
        buffer.truncate(self.num_bins());
        buffer
    }
}
