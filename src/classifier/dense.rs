// DenseNetwork - feed-forward network loaded from a JSON artifact
//
// Artifact layout:
//
//   {
//     "input_size": 20,
//     "mean":  [..20],            optional per-feature standardisation
//     "scale": [..20],            optional, x' = (x - mean) / scale
//     "layers": [
//       { "weights": [[..in] x out], "bias": [..out], "activation": "relu" },
//       ...
//       { "weights": [[..in]], "bias": [b], "activation": "sigmoid" }
//     ]
//   }
//
// `weights` is row-major with one row per output unit. The last layer has a
// single unit whose value is the positive-class probability.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::features::FeatureVector;
use crate::classifier::{Label, ProbabilityModel, SegmentClassifier};
use crate::config::ClassifierConfig;
use crate::error::ClassifierError;

/// Layer nonlinearity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    Linear,
}

impl Activation {
    fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
            Activation::Linear => x,
        }
    }
}

/// Fully connected layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    pub activation: Activation,
}

impl DenseLayer {
    fn forward(&self, input: &[f32]) -> Vec<f32> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| {
                let z: f32 = row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + b;
                self.activation.apply(z)
            })
            .collect()
    }
}

/// Feed-forward binary classifier network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseNetwork {
    pub input_size: usize,
    pub layers: Vec<DenseLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec<f32>>,
}

impl DenseNetwork {
    /// Parse and validate a network from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, ClassifierError> {
        let network: Self = serde_json::from_str(json).map_err(|err| ClassifierError::InvalidModel {
            reason: err.to_string(),
        })?;
        network.validate()?;
        Ok(network)
    }

    /// Read and validate a network artifact from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| ClassifierError::ModelLoad {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let network = Self::from_json_str(&contents)?;

        log::info!(
            "[Classifier] Loaded model from {:?} ({} inputs, {} layers)",
            path,
            network.input_size,
            network.layers.len()
        );
        Ok(network)
    }

    /// Check that layer shapes chain from `input_size` to a single output
    pub fn validate(&self) -> Result<(), ClassifierError> {
        let invalid = |reason: String| Err(ClassifierError::InvalidModel { reason });

        if self.input_size == 0 {
            return invalid("input_size must be greater than 0".to_string());
        }
        if self.layers.is_empty() {
            return invalid("model has no layers".to_string());
        }

        for (name, values) in [("mean", &self.mean), ("scale", &self.scale)] {
            if let Some(values) = values {
                if values.len() != self.input_size {
                    return invalid(format!(
                        "{} has {} entries, expected {}",
                        name,
                        values.len(),
                        self.input_size
                    ));
                }
            }
        }
        if let Some(scale) = &self.scale {
            if scale.iter().any(|&s| s == 0.0 || !s.is_finite()) {
                return invalid("scale entries must be finite and non-zero".to_string());
            }
        }

        let mut width = self.input_size;
        for (index, layer) in self.layers.iter().enumerate() {
            if layer.weights.is_empty() || layer.weights.len() != layer.bias.len() {
                return invalid(format!(
                    "layer {} has {} weight rows and {} biases",
                    index,
                    layer.weights.len(),
                    layer.bias.len()
                ));
            }
            if let Some(row) = layer.weights.iter().position(|row| row.len() != width) {
                return invalid(format!(
                    "layer {} row {} has {} weights, expected {}",
                    index,
                    row,
                    layer.weights[row].len(),
                    width
                ));
            }
            width = layer.weights.len();
        }

        if width != 1 {
            return invalid(format!("final layer has {} outputs, expected 1", width));
        }
        Ok(())
    }

    /// Run the network on one (unnormalised) feature vector
    pub fn forward(&self, features: &[f32]) -> Result<f32, ClassifierError> {
        if features.len() != self.input_size {
            return Err(ClassifierError::ShapeMismatch {
                expected: self.input_size,
                actual: features.len(),
            });
        }

        let mut activations: Vec<f32> = features
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let centred = self.mean.as_ref().map_or(x, |mean| x - mean[i]);
                self.scale.as_ref().map_or(centred, |scale| centred / scale[i])
            })
            .collect();

        for layer in &self.layers {
            activations = layer.forward(&activations);
        }

        let output = activations
            .first()
            .copied()
            .ok_or(ClassifierError::EmptyOutput)?;
        if !output.is_finite() {
            return Err(ClassifierError::Inference {
                reason: format!("network produced {}", output),
            });
        }
        Ok(output)
    }
}

impl ProbabilityModel for DenseNetwork {
    fn input_size(&self) -> usize {
        self.input_size
    }

    fn probability(&self, features: &[f32]) -> Result<f32, ClassifierError> {
        self.forward(features)
    }
}

/// Labels a vector positive when the model probability exceeds `threshold`
#[derive(Debug, Clone)]
pub struct ThresholdClassifier<M> {
    model: M,
    threshold: f32,
}

impl<M: ProbabilityModel> ThresholdClassifier<M> {
    pub fn new(model: M, threshold: f32) -> Self {
        Self { model, threshold }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl ThresholdClassifier<DenseNetwork> {
    /// Load the dense network named by the configuration
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let network = DenseNetwork::load(&config.model_path)?;
        Ok(Self::new(network, config.threshold))
    }
}

impl<M: ProbabilityModel> SegmentClassifier for ThresholdClassifier<M> {
    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<Label>, ClassifierError> {
        let expected = self.model.input_size();
        if let Some(bad) = features.iter().find(|f| f.len() != expected) {
            return Err(ClassifierError::ShapeMismatch {
                expected,
                actual: bad.len(),
            });
        }

        features
            .iter()
            .map(|vector| {
                let p = self.model.probability(vector.as_slice())?;
                Ok(if p > self.threshold {
                    Label::Positive
                } else {
                    Label::Negative
                })
            })
            .collect()
    }
}
