//! End-to-end tests of the diagnosis pipeline
//!
//! These tests run real WAV decoding, centroid segmentation, GFCC extraction
//! and the JSON dense network together, using synthetic recordings from
//! `auscult::testing`.

use std::io::Write;
use std::sync::Arc;

use auscult::classifier::{DenseNetwork, ThresholdClassifier};
use auscult::testing::{constant_model_json, HeartbeatSpec};
use auscult::{AppConfig, DiagnosisPipeline, Label, Outcome, PipelineError};

fn constant_pipeline(bias: f32) -> DiagnosisPipeline {
    let network = DenseNetwork::from_json_str(&constant_model_json(20, bias)).unwrap();
    DiagnosisPipeline::new(
        &AppConfig::default(),
        Arc::new(ThresholdClassifier::new(network, 0.5)),
    )
    .unwrap()
}

#[test]
fn test_positive_model_diagnoses_sick() {
    let report = constant_pipeline(4.0)
        .diagnose_wav(&HeartbeatSpec::default().wav_bytes())
        .unwrap();

    assert_eq!(report.segment_count(), 3);
    assert_eq!(report.labels, vec![Label::Positive; 3]);
    assert_eq!(report.verdict.outcome, Outcome::Positive);
    assert_eq!(report.verdict.message, "100.00% sure that the patient is sick");
}

#[test]
fn test_negative_model_diagnoses_healthy() {
    let report = constant_pipeline(-4.0)
        .diagnose_wav(&HeartbeatSpec::default().wav_bytes())
        .unwrap();

    assert_eq!(report.verdict.outcome, Outcome::Negative);
    assert_eq!(report.verdict.confidence_percent, Some(100.0));
}

#[test]
fn test_short_recording_is_undetermined() {
    let spec = HeartbeatSpec {
        duration_s: 2.0,
        ..HeartbeatSpec::default()
    };
    let report = constant_pipeline(4.0).diagnose_wav(&spec.wav_bytes()).unwrap();

    assert_eq!(report.segment_count(), 0);
    assert_eq!(report.verdict.outcome, Outcome::Undetermined);
    assert!(report.verdict.confidence_percent.is_none());
}

#[test]
fn test_model_with_wrong_input_size_fails_request() {
    let network = DenseNetwork::from_json_str(&constant_model_json(13, 1.0)).unwrap();
    let pipeline = DiagnosisPipeline::new(
        &AppConfig::default(),
        Arc::new(ThresholdClassifier::new(network, 0.5)),
    )
    .unwrap();

    let result = pipeline.diagnose_wav(&HeartbeatSpec::default().wav_bytes());
    assert!(matches!(result, Err(PipelineError::Classifier(_))));
}

#[test]
fn test_from_config_loads_model_artifact() {
    let mut model = tempfile::NamedTempFile::new().unwrap();
    model
        .write_all(constant_model_json(20, 4.0).as_bytes())
        .unwrap();

    let mut config = AppConfig::default();
    config.classifier.model_path = model.path().to_path_buf();

    let report = DiagnosisPipeline::from_config(&config)
        .unwrap()
        .diagnose(&HeartbeatSpec::default().signal())
        .unwrap();
    assert_eq!(report.verdict.outcome, Outcome::Positive);
}

#[test]
fn test_from_config_missing_model_is_classifier_error() {
    let mut config = AppConfig::default();
    config.classifier.model_path = "/no/such/model.json".into();

    assert!(matches!(
        DiagnosisPipeline::from_config(&config),
        Err(PipelineError::Classifier(_))
    ));
}

#[test]
fn test_concurrent_requests_share_pipeline() {
    let pipeline = Arc::new(constant_pipeline(4.0));
    let wav = HeartbeatSpec::default().wav_bytes();
    let expected = pipeline.diagnose_wav(&wav).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pipeline = Arc::clone(&pipeline);
                let wav = &wav;
                scope.spawn(move || pipeline.diagnose_wav(wav).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
