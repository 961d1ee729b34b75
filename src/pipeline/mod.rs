// DiagnosisPipeline - one recording in, one verdict out
//
// Stages: resample (if needed) → centroid curve → cycle segmentation →
// per-segment features → one batched classifier call → majority vote.
//
// Every call allocates its own curve, segments and tally; the only shared
// state is the read-only classifier behind an Arc, so one pipeline instance
// serves concurrent requests.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::analysis::centroid::CentroidTracker;
use crate::analysis::features::{FeatureExtractor, FeatureTransform, GfccExtractor};
use crate::analysis::segmenter::{CycleSegmenter, Segment, SegmentationReport};
use crate::analysis::vote::{Verdict, VoteTally};
use crate::audio::{load_wav, resample::resample, Signal};
use crate::classifier::{Label, SegmentClassifier, ThresholdClassifier};
use crate::config::AppConfig;
use crate::error::{ClassifierError, PipelineError};

/// Everything the pipeline learned about one recording
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosisReport {
    pub verdict: Verdict,
    pub tally: VoteTally,
    /// Recording length in seconds at the analysis rate
    pub duration_s: f64,
    pub segmentation: SegmentationReport,
    /// Classifier output per accepted segment, segment order
    pub labels: Vec<Label>,
}

impl DiagnosisReport {
    pub fn segments(&self) -> &[Segment] {
        &self.segmentation.accepted
    }

    pub fn segment_count(&self) -> usize {
        self.segmentation.accepted.len()
    }
}

/// Configured diagnosis pipeline
pub struct DiagnosisPipeline {
    sample_rate: u32,
    tracker: CentroidTracker,
    segmenter: CycleSegmenter,
    extractor: FeatureExtractor,
    classifier: Arc<dyn SegmentClassifier>,
}

impl DiagnosisPipeline {
    /// Build a pipeline with the default GFCC transform and `classifier`
    pub fn new(
        config: &AppConfig,
        classifier: Arc<dyn SegmentClassifier>,
    ) -> Result<Self, PipelineError> {
        let transform = GfccExtractor::new(&config.features, config.signal.sample_rate)?;
        Self::with_transform(config, Arc::new(transform), classifier)
    }

    /// Build a pipeline with a custom feature transform
    pub fn with_transform(
        config: &AppConfig,
        transform: Arc<dyn FeatureTransform>,
        classifier: Arc<dyn SegmentClassifier>,
    ) -> Result<Self, PipelineError> {
        if transform.sample_rate() != config.signal.sample_rate {
            return Err(PipelineError::Extraction {
                reason: format!(
                    "feature transform runs at {} Hz, pipeline at {} Hz",
                    transform.sample_rate(),
                    config.signal.sample_rate
                ),
            });
        }

        Ok(Self {
            sample_rate: config.signal.sample_rate,
            tracker: CentroidTracker::from_config(&config.centroid)?,
            segmenter: CycleSegmenter::new(config.segmentation.clone()),
            extractor: FeatureExtractor::new(transform),
            classifier,
        })
    }

    /// Build a pipeline whose classifier is loaded from `config.classifier`
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let classifier = ThresholdClassifier::from_config(&config.classifier)?;
        Self::new(config, Arc::new(classifier))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Decode WAV bytes and diagnose them
    pub fn diagnose_wav(&self, bytes: &[u8]) -> Result<DiagnosisReport, PipelineError> {
        let signal = load_wav(bytes, self.sample_rate)?;
        self.diagnose(&signal)
    }

    /// Locate the cycle windows of `signal` without classifying them
    pub fn segment(&self, signal: &Signal) -> Result<SegmentationReport, PipelineError> {
        let signal = self.at_analysis_rate(signal)?;
        self.segment_prepared(&signal)
    }

    /// Run every stage on `signal`
    pub fn diagnose(&self, signal: &Signal) -> Result<DiagnosisReport, PipelineError> {
        let started = Instant::now();
        let signal = self.at_analysis_rate(signal)?;
        let segmentation = self.segment_prepared(&signal)?;

        let labels = if segmentation.accepted.is_empty() {
            tracing::info!(
                "[Pipeline] no valid segments in {:.2}s recording, skipping classifier",
                signal.duration_s()
            );
            Vec::new()
        } else {
            let features = self.extractor.extract_all(&signal, &segmentation.accepted)?;
            let labels = self.classifier.predict(&features)?;
            if labels.len() != features.len() {
                return Err(ClassifierError::EmptyOutput.into());
            }
            labels
        };

        let tally = VoteTally::from_labels(&labels);
        let verdict = tally.verdict();

        tracing::info!(
            "[Pipeline] {:?} from {} segment(s) ({} positive / {} negative) in {:?}",
            verdict.outcome,
            labels.len(),
            tally.positive,
            tally.negative,
            started.elapsed()
        );

        Ok(DiagnosisReport {
            verdict,
            tally,
            duration_s: signal.duration_s(),
            segmentation,
            labels,
        })
    }

    fn segment_prepared(&self, signal: &Signal) -> Result<SegmentationReport, PipelineError> {
        let curve = self.tracker.compute(signal.samples(), signal.sample_rate())?;

        let report = self.segmenter.segment_with_report(&curve, signal.duration_s());
        tracing::debug!(
            "[Pipeline] {} frame(s), {} of {} segment(s) accepted, {} peak(s) rejected",
            curve.len(),
            report.accepted.len(),
            report.target_count,
            report.rejected_peaks.len()
        );
        Ok(report)
    }

    fn at_analysis_rate(&self, signal: &Signal) -> Result<Signal, PipelineError> {
        if signal.sample_rate() == self.sample_rate {
            return Ok(signal.clone());
        }
        tracing::debug!(
            "[Pipeline] resampling {} Hz input to {} Hz",
            signal.sample_rate(),
            self.sample_rate
        );
        let samples = resample(signal.samples(), signal.sample_rate(), self.sample_rate)?;
        Ok(Signal::new(samples, self.sample_rate)?)
    }
}
