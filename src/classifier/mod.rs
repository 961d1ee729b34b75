// Classifier - segment feature vectors to binary labels
//
// The model is loaded once and shared read-only across requests, so every
// classifier is Send + Sync and takes &self. Prediction is batched: one call per
// recording with the vectors in segment order.

mod dense;

pub use dense::{Activation, DenseLayer, DenseNetwork, ThresholdClassifier};

use serde::{Deserialize, Serialize};

use crate::analysis::features::FeatureVector;
use crate::error::ClassifierError;

/// Binary segment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Class 0
    Negative,
    /// Class 1
    Positive,
}

impl Label {
    /// Label for a 0/1 class index (any non-zero value is positive)
    pub fn from_class(class: u8) -> Self {
        if class == 0 {
            Label::Negative
        } else {
            Label::Positive
        }
    }

    pub fn as_class(self) -> u8 {
        match self {
            Label::Negative => 0,
            Label::Positive => 1,
        }
    }
}

/// Batch classifier over segment feature vectors
pub trait SegmentClassifier: Send + Sync {
    /// One label per input vector, same order
    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<Label>, ClassifierError>;
}

/// Model that scores each vector with a probability of the positive class
pub trait ProbabilityModel: Send + Sync {
    /// Expected feature vector length
    fn input_size(&self) -> usize;

    /// Positive-class probability of one vector
    fn probability(&self, features: &[f32]) -> Result<f32, ClassifierError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_class_mapping() {
        assert_eq!(Label::from_class(0), Label::Negative);
        assert_eq!(Label::from_class(1), Label::Positive);
        assert_eq!(Label::Positive.as_class(), 1);
        assert_eq!(Label::Negative.as_class(), 0);
    }

    #[test]
    fn test_label_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Label::Positive).unwrap(), "\"positive\"");
    }
}
