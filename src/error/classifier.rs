// Classifier error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Classifier error code constants
///
/// Error code range: 2001-2005
pub struct ClassifierErrorCodes {}

impl ClassifierErrorCodes {
    /// Model artifact could not be read or parsed
    pub const MODEL_LOAD: i32 = 2001;

    /// Model artifact is structurally inconsistent
    pub const INVALID_MODEL: i32 = 2002;

    /// Feature vector length does not match the model input
    pub const SHAPE_MISMATCH: i32 = 2003;

    /// Inference produced an unusable value
    pub const INFERENCE: i32 = 2004;

    /// Model returned a different number of outputs than inputs
    pub const EMPTY_OUTPUT: i32 = 2005;
}

/// Log a classifier error with structured context
pub fn log_classifier_error(err: &ClassifierError, context: &str) {
    error!("{}", classifier_error_record(err, context));
}

fn classifier_error_record(err: &ClassifierError, context: &str) -> String {
    format!(
        "Classifier error in {}: code={}, component=SegmentClassifier, message={}",
        context,
        err.code(),
        err.message()
    )
}

/// Model load and inference errors
///
/// Always fatal to the request that hit them.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// Model artifact could not be read or parsed
    ModelLoad { path: String, reason: String },

    /// Model layers do not chain together
    InvalidModel { reason: String },

    /// Feature vector length does not match the model input
    ShapeMismatch { expected: usize, actual: usize },

    /// Inference produced a non-finite value
    Inference { reason: String },

    /// Output batch length differs from input batch length
    EmptyOutput,
}

impl ErrorCode for ClassifierError {
    fn code(&self) -> i32 {
        match self {
            ClassifierError::ModelLoad { .. } => ClassifierErrorCodes::MODEL_LOAD,
            ClassifierError::InvalidModel { .. } => ClassifierErrorCodes::INVALID_MODEL,
            ClassifierError::ShapeMismatch { .. } => ClassifierErrorCodes::SHAPE_MISMATCH,
            ClassifierError::Inference { .. } => ClassifierErrorCodes::INFERENCE,
            ClassifierError::EmptyOutput => ClassifierErrorCodes::EMPTY_OUTPUT,
        }
    }

    fn message(&self) -> String {
        match self {
            ClassifierError::ModelLoad { path, reason } => {
                format!("Failed to load model from {}: {}", path, reason)
            }
            ClassifierError::InvalidModel { reason } => format!("Invalid model: {}", reason),
            ClassifierError::ShapeMismatch { expected, actual } => format!(
                "Feature vector has {} values, model expects {}",
                actual, expected
            ),
            ClassifierError::Inference { reason } => format!("Inference failed: {}", reason),
            ClassifierError::EmptyOutput => {
                "Model output does not match the input batch".to_string()
            }
        }
    }
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ClassifierError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ClassifierError {}
