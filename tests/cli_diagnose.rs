use std::path::{Path, PathBuf};
use std::process::Command;

use auscult::testing::{constant_model_json, HeartbeatSpec};
use serde_json::Value;

fn cli() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_auscult_cli"));
    command.env_remove("AUSCULT_MODEL_PATH").env("AUSCULT_LOG", "warn");
    command
}

fn write_fixtures(dir: &Path, bias: f32) -> (PathBuf, PathBuf) {
    let wav = dir.join("AB12_visit.wav");
    std::fs::write(&wav, HeartbeatSpec::default().wav_bytes()).expect("write wav");
    let model = dir.join("model.json");
    std::fs::write(&model, constant_model_json(20, bias)).expect("write model");
    (wav, model)
}

#[test]
fn diagnose_prints_json_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (wav, model) = write_fixtures(dir.path(), 4.0);

    let output = cli()
        .args(["diagnose", "--file"])
        .arg(&wav)
        .arg("--model")
        .arg(&model)
        .output()
        .expect("diagnose command");

    assert!(
        output.status.success(),
        "diagnose exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).expect("JSON report");
    assert_eq!(json["patient_id"], 12);
    assert_eq!(json["verdict"]["outcome"], "positive");
    assert_eq!(json["tally"]["positive"], 3);
    assert_eq!(json["segmentation"]["accepted"].as_array().map(Vec::len), Some(3));
}

#[test]
fn diagnose_fails_without_model() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (wav, _) = write_fixtures(dir.path(), 4.0);

    let output = cli()
        .args(["diagnose", "--file"])
        .arg(&wav)
        .arg("--model")
        .arg(dir.path().join("missing.json"))
        .output()
        .expect("diagnose command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.json"), "stderr was {stderr}");
}

#[test]
fn segment_lists_windows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (wav, _) = write_fixtures(dir.path(), 0.0);

    let output = cli()
        .args(["segment", "--file"])
        .arg(&wav)
        .output()
        .expect("segment command");

    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("JSON report");
    assert_eq!(json["target_count"], 3);
    let accepted = json["accepted"].as_array().expect("accepted array");
    assert_eq!(accepted.len(), 3);
    for segment in accepted {
        let length = segment["end_s"].as_f64().unwrap() - segment["start_s"].as_f64().unwrap();
        assert!((length - 2.5).abs() < 1e-9);
    }
}

#[test]
fn patient_id_parses_filenames() {
    let output = cli()
        .args(["patient-id", "034_bar.wav"])
        .output()
        .expect("patient-id command");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "34");

    let output = cli()
        .args(["patient-id", "recording.wav"])
        .output()
        .expect("patient-id command");
    assert_eq!(output.status.code(), Some(1));
}
