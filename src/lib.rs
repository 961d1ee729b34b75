// Auscult Core - heart/lung sound diagnosis pipeline
// Centroid-guided cycle segmentation, cepstral features and segment voting

// Module declarations
pub mod analysis;
pub mod audio;
pub mod classifier;
pub mod config;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod patient;
pub mod pipeline;
pub mod testing;

// Re-exports for convenience
pub use analysis::vote::{aggregate, Outcome, Verdict, VoteTally};
pub use audio::Signal;
pub use classifier::{Label, SegmentClassifier};
pub use config::AppConfig;
pub use error::{ClassifierError, InputError, PipelineError};
pub use patient::PatientId;
pub use pipeline::{DiagnosisPipeline, DiagnosisReport};

use once_cell::sync::OnceCell;

static LOGGING: OnceCell<()> = OnceCell::new();

/// Initialize the tracing subscriber once per process
///
/// The level is read from `AUSCULT_LOG` (error, warn, info, debug, trace) and
/// defaults to info. Output goes to stderr so CLI reports on stdout stay
/// machine-readable; `log` records are bridged into the same subscriber.
pub fn init_logging() {
    LOGGING.get_or_init(|| {
        let level = std::env::var("AUSCULT_LOG")
            .ok()
            .and_then(|raw| raw.parse::<tracing::Level>().ok())
            .unwrap_or(tracing::Level::INFO);

        if tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
            .is_err()
        {
            // Another subscriber (e.g. a test harness) is already installed.
            log::debug!("tracing subscriber already initialised");
        }
    });
}
