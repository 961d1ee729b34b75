// Error types for the auscultation diagnosis pipeline
//
// This module defines the error taxonomy for signal input and classifier
// operations, plus the request-level `PipelineError` that the CLI and HTTP
// layers surface. Degraded segmentation (fewer cycles than requested, or none)
// is reported through the verdict and never through these types.

mod classifier;
mod input;

pub use classifier::{log_classifier_error, ClassifierError, ClassifierErrorCodes};
pub use input::{log_input_error, InputError, InputErrorCodes};

use std::fmt;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, so the HTTP and CLI surfaces can report
/// failures consistently.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Pipeline error code constants (range 3001-3002)
pub struct PipelineErrorCodes {}

impl PipelineErrorCodes {
    /// Cepstral feature extraction failed for a segment
    pub const EXTRACTION_FAILED: i32 = 3001;

    /// The request did not finish within the configured deadline
    pub const TIMEOUT: i32 = 3002;
}

/// Request-level failure of the diagnosis pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Empty, corrupt or unparseable input
    Input(InputError),

    /// Model load or inference failure
    Classifier(ClassifierError),

    /// Feature transform failed on an accepted segment
    Extraction { reason: String },

    /// Request exceeded its deadline
    Timeout { limit_ms: u64 },
}

impl PipelineError {
    /// Whether the failure was caused by the caller's input (client error)
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Input(_))
    }
}

impl ErrorCode for PipelineError {
    fn code(&self) -> i32 {
        match self {
            PipelineError::Input(err) => err.code(),
            PipelineError::Classifier(err) => err.code(),
            PipelineError::Extraction { .. } => PipelineErrorCodes::EXTRACTION_FAILED,
            PipelineError::Timeout { .. } => PipelineErrorCodes::TIMEOUT,
        }
    }

    fn message(&self) -> String {
        match self {
            PipelineError::Input(err) => err.message(),
            PipelineError::Classifier(err) => err.message(),
            PipelineError::Extraction { reason } => {
                format!("Feature extraction failed: {}", reason)
            }
            PipelineError::Timeout { limit_ms } => {
                format!("Diagnosis did not complete within {} ms", limit_ms)
            }
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Input(err) => write!(f, "{}", err),
            PipelineError::Classifier(err) => write!(f, "{}", err),
            _ => write!(
                f,
                "PipelineError (code {}): {}",
                self.code(),
                self.message()
            ),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Input(err) => Some(err),
            PipelineError::Classifier(err) => Some(err),
            _ => None,
        }
    }
}

/// Log a request-level failure through the helper for its error family
pub fn log_pipeline_error(err: &PipelineError, context: &str) {
    match err {
        PipelineError::Input(err) => log_input_error(err, context),
        PipelineError::Classifier(err) => log_classifier_error(err, context),
        other => log::error!(
            "Pipeline error in {}: code={}, component=DiagnosisPipeline, message={}",
            context,
            other.code(),
            other.message()
        ),
    }
}

impl From<InputError> for PipelineError {
    fn from(err: InputError) -> Self {
        PipelineError::Input(err)
    }
}

impl From<ClassifierError> for PipelineError {
    fn from(err: ClassifierError) -> Self {
        PipelineError::Classifier(err)
    }
}
