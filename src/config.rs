//! Configuration management for the diagnosis pipeline
//!
//! This module provides runtime configuration loading from JSON files so the
//! analysis rate, segmentation windows, feature layout and service limits can
//! be adjusted without recompilation. Every section has defaults matching the
//! reference recordings (4 kHz mono, 2.5 s cardiac cycles).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the optional configuration file
pub const DEFAULT_CONFIG_PATH: &str = "assets/auscult_config.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub signal: SignalConfig,
    pub centroid: CentroidConfig,
    pub segmentation: SegmentationConfig,
    pub features: FeatureConfig,
    pub classifier: ClassifierConfig,
    pub server: ServerConfig,
}

/// Signal loading parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Every recording is resampled to this rate (Hz) before analysis
    pub sample_rate: u32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self { sample_rate: 4000 }
    }
}

/// Spectral-centroid curve parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CentroidConfig {
    /// FFT frame size in samples
    pub frame_size: usize,
    /// Hop between frame centres in samples
    pub hop_length: usize,
}

impl Default for CentroidConfig {
    fn default() -> Self {
        Self {
            frame_size: 1024,
            hop_length: 512,
        }
    }
}

/// Cycle segmentation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Expected length of one cycle in seconds
    pub cycle_period_s: f64,
    /// Seconds kept before each peak
    pub pre_roll_s: f64,
    /// Seconds kept after each peak
    pub post_roll_s: f64,
    /// Frames suppressed before an accepted peak
    pub suppress_before: usize,
    /// Frames suppressed after an accepted peak
    pub suppress_after: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            cycle_period_s: 2.5,
            pre_roll_s: 0.8,
            post_roll_s: 1.7,
            suppress_before: 5,
            suppress_after: 12,
        }
    }
}

/// Gammatone cepstral feature parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Number of cepstral coefficients per feature vector
    pub num_coeffs: usize,
    /// FFT size for each analysis frame
    pub fft_size: usize,
    /// Number of gammatone filters
    pub num_filters: usize,
    /// Analysis frame length in seconds
    pub frame_length_s: f64,
    /// Analysis frame hop in seconds
    pub frame_hop_s: f64,
    /// Pre-emphasis coefficient (0 disables)
    pub pre_emphasis: f32,
    /// Lowest filter centre frequency in Hz
    pub low_freq_hz: f32,
    /// Highest filter centre frequency in Hz (None = Nyquist)
    pub high_freq_hz: Option<f32>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            num_coeffs: 20,
            fft_size: 512,
            num_filters: 24,
            frame_length_s: 0.025,
            frame_hop_s: 0.01,
            pre_emphasis: 0.97,
            low_freq_hz: 0.0,
            high_freq_hz: None,
        }
    }
}

/// Classifier artifact parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Path to the dense network JSON artifact
    pub model_path: PathBuf,
    /// Probability above which a segment is labelled positive
    pub threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/model.json"),
            threshold: 0.5,
        }
    }
}

/// Upload service parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener
    pub addr: String,
    /// Requests processed concurrently
    pub max_concurrent_requests: usize,
    /// Per-request deadline in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum accepted upload size in bytes
    pub upload_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5000".to_string(),
            max_concurrent_requests: 4,
            request_timeout_ms: 30_000,
            upload_limit_bytes: 20 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults when the file is missing or
    /// invalid (a warning is logged in both cases)
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load the default config file, then apply environment overrides
    ///
    /// `AUSCULT_HTTP_ADDR` replaces `server.addr` and `AUSCULT_MODEL_PATH`
    /// replaces `classifier.model_path`.
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_PATH).with_env_overrides()
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(addr) = std::env::var("AUSCULT_HTTP_ADDR") {
            self.server.addr = addr;
        }
        if let Ok(path) = std::env::var("AUSCULT_MODEL_PATH") {
            self.classifier.model_path = PathBuf::from(path);
        }
        self
    }
}
