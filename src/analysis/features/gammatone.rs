// Gammatone filterbank - auditory band energies from a power spectrum
//
// Centre frequencies are equally spaced on the ERB-rate scale
//
//   E(f) = 21.4 × log10(1 + 0.00437 f)
//
// between the low and high edge (edges excluded). Each filter uses the
// magnitude response of a 4th-order gammatone approximated in the frequency
// domain:
//
//   |H(f)| = (1 + ((f - fc) / b)^2)^-2,   b = 1.019 × ERB(fc)
//   ERB(fc) = 24.7 × (4.37 fc / 1000 + 1)

/// ERB-rate (Cams) of frequency `hz`
pub fn erb_rate(hz: f32) -> f32 {
    21.4 * (1.0 + 0.00437 * hz).log10()
}

/// Frequency in Hz of ERB-rate `cams`
pub fn erb_rate_to_hz(cams: f32) -> f32 {
    (10f32.powf(cams / 21.4) - 1.0) / 0.00437
}

/// Equivalent rectangular bandwidth at `hz`
pub fn equivalent_bandwidth(hz: f32) -> f32 {
    24.7 * (4.37 * hz / 1000.0 + 1.0)
}

/// Bank of gammatone magnitude responses sampled at FFT bin frequencies
#[derive(Debug, Clone)]
pub struct GammatoneFilterbank {
    centres_hz: Vec<f32>,
    /// `weights[filter][bin]`
    weights: Vec<Vec<f32>>,
}

impl GammatoneFilterbank {
    /// Build the filterbank
    ///
    /// # Arguments
    /// * `num_filters` - number of bands
    /// * `fft_size` - FFT length (spectra have `fft_size / 2 + 1` bins)
    /// * `sample_rate` - sample rate in Hz
    /// * `low_hz` / `high_hz` - edges of the ERB-spaced range
    pub fn new(num_filters: usize, fft_size: usize, sample_rate: u32, low_hz: f32, high_hz: f32) -> Self {
        let num_bins = fft_size / 2 + 1;
        let low = erb_rate(low_hz.max(0.0));
        let high = erb_rate(high_hz.max(low_hz));
        let step = (high - low) / (num_filters as f32 + 1.0);

        let centres_hz: Vec<f32> = (0..num_filters)
            .map(|k| erb_rate_to_hz(low + step * (k as f32 + 1.0)))
            .collect();

        let bin_hz = sample_rate as f32 / fft_size as f32;
        let weights = centres_hz
            .iter()
            .map(|&fc| {
                let b = 1.019 * equivalent_bandwidth(fc);
                (0..num_bins)
                    .map(|bin| {
                        let x = (bin as f32 * bin_hz - fc) / b;
                        (1.0 + x * x).powi(-2)
                    })
                    .collect()
            })
            .collect();

        Self {
            centres_hz,
            weights,
        }
    }

    pub fn num_filters(&self) -> usize {
        self.centres_hz.len()
    }

    pub fn centres_hz(&self) -> &[f32] {
        &self.centres_hz
    }

    /// Band energies `Σ_k w[m][k] × P[k]` of a power spectrum
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.weights
            .iter()
            .map(|row| row.iter().zip(power).map(|(w, p)| w * p).sum())
            .collect()
    }
}
