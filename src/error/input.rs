// Input error types and constants

use crate::error::ErrorCode;
use log::warn;
use std::fmt;

/// Input error code constants
///
/// Error code range: 1001-1006
pub struct InputErrorCodes {}

impl InputErrorCodes {
    /// Signal contains no samples
    pub const EMPTY_SIGNAL: i32 = 1001;

    /// Sample rate is zero
    pub const INVALID_SAMPLE_RATE: i32 = 1002;

    /// Frame size or hop length is zero
    pub const INVALID_FRAMING: i32 = 1003;

    /// Audio bytes could not be decoded
    pub const DECODE_FAILED: i32 = 1004;

    /// Audio encoding is not supported
    pub const UNSUPPORTED_FORMAT: i32 = 1005;

    /// Patient identifier could not be parsed from the filename
    pub const INVALID_IDENTIFIER: i32 = 1006;
}

/// Log an input error with structured context
pub fn log_input_error(err: &InputError, context: &str) {
    warn!("{}", input_error_record(err, context));
}

fn input_error_record(err: &InputError, context: &str) -> String {
    format!(
        "Input error in {}: code={}, component=SignalLoader, message={}",
        context,
        err.code(),
        err.message()
    )
}

/// Errors caused by the recording or its metadata
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    /// Signal contains no samples
    EmptySignal,

    /// Sample rate must be positive
    InvalidSampleRate { sample_rate: u32 },

    /// Analysis framing parameters must be positive
    InvalidFraming { frame_size: usize, hop_length: usize },

    /// Audio bytes could not be decoded
    Decode { reason: String },

    /// Audio encoding is not supported
    UnsupportedFormat { details: String },

    /// Filename does not carry a patient identifier
    InvalidIdentifier { filename: String },
}

impl ErrorCode for InputError {
    fn code(&self) -> i32 {
        match self {
            InputError::EmptySignal => InputErrorCodes::EMPTY_SIGNAL,
            InputError::InvalidSampleRate { .. } => InputErrorCodes::INVALID_SAMPLE_RATE,
            InputError::InvalidFraming { .. } => InputErrorCodes::INVALID_FRAMING,
            InputError::Decode { .. } => InputErrorCodes::DECODE_FAILED,
            InputError::UnsupportedFormat { .. } => InputErrorCodes::UNSUPPORTED_FORMAT,
            InputError::InvalidIdentifier { .. } => InputErrorCodes::INVALID_IDENTIFIER,
        }
    }

    fn message(&self) -> String {
        match self {
            InputError::EmptySignal => "Signal contains no samples".to_string(),
            InputError::InvalidSampleRate { sample_rate } => {
                format!("Sample rate must be greater than 0 (got {})", sample_rate)
            }
            InputError::InvalidFraming {
                frame_size,
                hop_length,
            } => format!(
                "Frame size and hop length must be greater than 0 (got {} / {})",
                frame_size, hop_length
            ),
            InputError::Decode { reason } => format!("Failed to decode audio: {}", reason),
            InputError::UnsupportedFormat { details } => {
                format!("Unsupported audio format: {}", details)
            }
            InputError::InvalidIdentifier { filename } => {
                format!("Cannot derive a patient identifier from '{}'", filename)
            }
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InputError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for InputError {}

impl From<hound::Error> for InputError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::Unsupported => InputError::UnsupportedFormat {
                details: "WAV feature not supported".to_string(),
            },
            other => InputError::Decode {
                reason: other.to_string(),
            },
        }
    }
}
