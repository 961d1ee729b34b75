//! Deterministic signal sources and classifier doubles for tests.
//!
//! Everything here is pure and seeded so unit tests, integration tests and the
//! CLI smoke tests see identical recordings on every run without shipping WAV
//! fixtures.

use std::f32::consts::PI;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use hound::{SampleFormat, WavSpec, WavWriter};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::analysis::features::FeatureVector;
use crate::audio::Signal;
use crate::classifier::{Label, SegmentClassifier};
use crate::error::ClassifierError;

/// Pure sine tone
pub fn sine_wave(sample_rate: u32, frequency_hz: f32, len: usize, amplitude: f32) -> Vec<f32> {
    (0..len)
        .map(|i| amplitude * (2.0 * PI * frequency_hz * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// Parameters of a synthetic auscultation recording
///
/// Short bright bursts (the "beats") repeat every `beat_period_s` over a quiet
/// low-frequency hum with a little seeded noise, so the centroid curve peaks
/// once per beat.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatSpec {
    pub sample_rate: u32,
    pub duration_s: f32,
    pub beat_period_s: f32,
    pub first_beat_s: f32,
    pub burst_hz: f32,
    pub burst_len_s: f32,
    pub amplitude: f32,
    pub hum_amplitude: f32,
    pub noise_amplitude: f32,
    pub seed: u64,
}

impl Default for HeartbeatSpec {
    fn default() -> Self {
        Self {
            sample_rate: 4000,
            duration_s: 12.0,
            beat_period_s: 2.5,
            first_beat_s: 1.0,
            burst_hz: 1500.0,
            burst_len_s: 0.12,
            amplitude: 0.6,
            hum_amplitude: 0.05,
            noise_amplitude: 0.005,
            seed: 0x5EED_0001,
        }
    }
}

impl HeartbeatSpec {
    /// Beat onset times in seconds
    pub fn beat_times(&self) -> Vec<f32> {
        let mut times = Vec::new();
        let mut t = self.first_beat_s;
        while t + self.burst_len_s <= self.duration_s {
            times.push(t);
            t += self.beat_period_s;
        }
        times
    }

    /// Render the recording
    pub fn samples(&self) -> Vec<f32> {
        let sr = self.sample_rate as f32;
        let len = (self.duration_s * sr) as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut samples: Vec<f32> = (0..len)
            .map(|i| {
                let t = i as f32 / sr;
                self.hum_amplitude * (2.0 * PI * 60.0 * t).sin()
                    + self.noise_amplitude * rng.gen_range(-1.0f32..1.0)
            })
            .collect();

        let burst_len = (self.burst_len_s * sr) as usize;
        for onset in self.beat_times() {
            let start = (onset * sr) as usize;
            for n in 0..burst_len {
                let Some(slot) = samples.get_mut(start + n) else {
                    break;
                };
                // Hann envelope keeps the burst free of clicks
                let envelope = 0.5 - 0.5 * (2.0 * PI * n as f32 / burst_len as f32).cos();
                *slot += self.amplitude * envelope * (2.0 * PI * self.burst_hz * n as f32 / sr).sin();
            }
        }
        samples
    }

    pub fn signal(&self) -> Signal {
        match Signal::new(self.samples(), self.sample_rate) {
            Ok(signal) => signal,
            Err(err) => panic!("synthetic recording is invalid: {}", err),
        }
    }

    /// Render as 16-bit mono WAV bytes
    pub fn wav_bytes(&self) -> Vec<u8> {
        wav_bytes(&self.samples(), self.sample_rate)
    }
}

/// Encode samples as 16-bit mono PCM WAV
pub fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let written = WavWriter::new(&mut cursor, spec).and_then(|mut writer| {
        for &sample in samples {
            writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
        }
        writer.finalize()
    });
    if let Err(err) = written {
        panic!("writing WAV to memory failed: {}", err);
    }
    cursor.into_inner()
}

/// Classifier double returning a fixed label script
///
/// Vector `n` of a batch gets `script[n % script.len()]`; an empty script
/// labels everything negative. Calls are counted.
#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    script: Vec<Label>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new(script: Vec<Label>) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(label: Label) -> Self {
        Self::new(vec![label])
    }

    /// Number of `predict` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SegmentClassifier for ScriptedClassifier {
    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<Label>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..features.len())
            .map(|n| {
                if self.script.is_empty() {
                    Label::Negative
                } else {
                    self.script[n % self.script.len()]
                }
            })
            .collect())
    }
}

/// Classifier double that always fails inference
#[derive(Debug, Default)]
pub struct FailingClassifier;

impl SegmentClassifier for FailingClassifier {
    fn predict(&self, _features: &[FeatureVector]) -> Result<Vec<Label>, ClassifierError> {
        Err(ClassifierError::Inference {
            reason: "scripted failure".to_string(),
        })
    }
}

/// Classifier double that drops the last label of every batch
#[derive(Debug, Default)]
pub struct ShortBatchClassifier;

impl SegmentClassifier for ShortBatchClassifier {
    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<Label>, ClassifierError> {
        Ok(vec![Label::Positive; features.len().saturating_sub(1)])
    }
}

/// JSON artifact of a one-layer network over `input_size` features
///
/// The network ignores its inputs and outputs `sigmoid(bias)`, so a positive
/// bias labels every segment positive and a negative bias labels every
/// segment negative.
pub fn constant_model_json(input_size: usize, bias: f32) -> String {
    serde_json::json!({
        "input_size": input_size,
        "layers": [{
            "weights": [vec![0.0f32; input_size]],
            "bias": [bias],
            "activation": "sigmoid"
        }]
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::load_wav;

    #[test]
    fn test_heartbeat_is_deterministic() {
        let spec = HeartbeatSpec::default();
        assert_eq!(spec.samples(), spec.samples());
        assert_eq!(spec.samples().len(), 48_000);
    }

    #[test]
    fn test_beat_times() {
        let spec = HeartbeatSpec::default();
        assert_eq!(spec.beat_times(), vec![1.0, 3.5, 6.0, 8.5, 11.0]);
    }

    #[test]
    fn test_wav_bytes_decode() {
        let signal = load_wav(&wav_bytes(&[0.5, -0.5, 0.0], 4000), 4000).unwrap();
        assert_eq!(signal.len(), 3);
        assert!((signal.samples()[0] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_scripted_classifier_cycles() {
        let classifier = ScriptedClassifier::new(vec![Label::Positive, Label::Negative]);
        let batch = vec![FeatureVector::new(vec![0.0]); 3];
        assert_eq!(
            classifier.predict(&batch).unwrap(),
            vec![Label::Positive, Label::Negative, Label::Positive]
        );
        assert_eq!(classifier.calls(), 1);
    }
}
