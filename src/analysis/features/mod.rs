// FeatureExtractor - fixed-length descriptors for segmented cycles
//
// Module organization:
// - gammatone: ERB-spaced gammatone magnitude filterbank
// - gfcc: gammatone frequency cepstral coefficients (default transform)
// - mod.rs: FeatureVector, FeatureTransform seam, FeatureExtractor
//
// The classifier only ever sees FeatureVector values, so any transform that
// maps a sample slice to a fixed-length vector can be plugged in behind
// FeatureTransform (tests use small deterministic transforms).

mod gammatone;
mod gfcc;

pub use gammatone::GammatoneFilterbank;
pub use gfcc::GfccExtractor;

use std::sync::Arc;

use serde::Serialize;

use crate::analysis::segmenter::Segment;
use crate::audio::Signal;
use crate::error::PipelineError;

/// Cepstral descriptor of one segment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Maps a segment's samples to a feature vector of fixed dimension
pub trait FeatureTransform: Send + Sync {
    /// Length of every vector this transform returns
    fn dimension(&self) -> usize;

    /// Sample rate the transform was configured for
    fn sample_rate(&self) -> u32;

    /// Compute the descriptor of `samples`
    fn transform(&self, samples: &[f32]) -> Result<FeatureVector, PipelineError>;
}

/// Cuts segments out of a signal and runs the configured transform on them
#[derive(Clone)]
pub struct FeatureExtractor {
    transform: Arc<dyn FeatureTransform>,
}

impl FeatureExtractor {
    pub fn new(transform: Arc<dyn FeatureTransform>) -> Self {
        Self { transform }
    }

    pub fn dimension(&self) -> usize {
        self.transform.dimension()
    }

    /// Feature vector for `segment` of `signal`
    ///
    /// # Returns
    /// A vector of length `dimension()`; `PipelineError::Extraction` when the
    /// signal rate does not match the transform or the output is malformed
    pub fn extract(&self, signal: &Signal, segment: &Segment) -> Result<FeatureVector, PipelineError> {
        if signal.sample_rate() != self.transform.sample_rate() {
            return Err(PipelineError::Extraction {
                reason: format!(
                    "signal is {} Hz but the feature transform expects {} Hz",
                    signal.sample_rate(),
                    self.transform.sample_rate()
                ),
            });
        }

        let slice = signal.slice_seconds(segment.start_s, segment.end_s);
        let vector = self.transform.transform(slice)?;

        if vector.len() != self.dimension() {
            return Err(PipelineError::Extraction {
                reason: format!(
                    "transform returned {} values, expected {}",
                    vector.len(),
                    self.dimension()
                ),
            });
        }
        if vector.as_slice().iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::Extraction {
                reason: format!(
                    "non-finite feature value in segment at {:.3}s",
                    segment.peak_time_s
                ),
            });
        }

        Ok(vector)
    }

    /// Extract every segment in order
    pub fn extract_all(
        &self,
        signal: &Signal,
        segments: &[Segment],
    ) -> Result<Vec<FeatureVector>, PipelineError> {
        segments
            .iter()
            .map(|segment| self.extract(signal, segment))
            .collect()
    }
}
