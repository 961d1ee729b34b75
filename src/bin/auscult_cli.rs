use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use auscult::analysis::{CentroidTracker, CycleSegmenter, SegmentationReport};
use auscult::audio::load_wav_file;
use auscult::error::{log_input_error, log_pipeline_error, PipelineError};
use auscult::{AppConfig, DiagnosisPipeline, DiagnosisReport, PatientId};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "auscult_cli",
    about = "Heart/lung sound segmentation and diagnosis"
)]
struct Cli {
    /// JSON configuration file (defaults to assets/auscult_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Diagnose a WAV recording and print the report as JSON
    Diagnose {
        #[arg(long)]
        file: PathBuf,
        /// Classifier artifact overriding the configured model path
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Print the cycle windows found in a WAV recording
    Segment {
        #[arg(long)]
        file: PathBuf,
    },
    /// Print the patient identifier encoded in a filename
    PatientId { filename: String },
    /// Run the HTTP upload service
    Serve {
        #[arg(long)]
        addr: Option<SocketAddr>,
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct DiagnoseOutput<'a> {
    file: String,
    patient_id: Option<PatientId>,
    #[serde(flatten)]
    report: &'a DiagnosisReport,
}

fn main() -> ExitCode {
    auscult::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path).with_env_overrides(),
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Diagnose { file, model } => run_diagnose(config, &file, model),
        Commands::Segment { file } => run_segment(&config, &file),
        Commands::PatientId { filename } => Ok(run_patient_id(&filename)),
        Commands::Serve { addr, model } => run_serve(config, addr, model),
    }
}

fn run_diagnose(mut config: AppConfig, file: &Path, model: Option<PathBuf>) -> Result<ExitCode> {
    if let Some(model) = model {
        config.classifier.model_path = model;
    }
    let pipeline = DiagnosisPipeline::from_config(&config)
        .map_err(|err| logged(err, "diagnose"))
        .context("building diagnosis pipeline")?;

    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let report = pipeline
        .diagnose_wav(&bytes)
        .map_err(|err| logged(err, "diagnose"))
        .with_context(|| format!("diagnosing {}", file.display()))?;

    let output = DiagnoseOutput {
        file: file.display().to_string(),
        patient_id: file
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| PatientId::from_filename(name).ok()),
        report: &report,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(ExitCode::SUCCESS)
}

fn logged(err: PipelineError, context: &str) -> PipelineError {
    log_pipeline_error(&err, context);
    err
}

fn run_segment(config: &AppConfig, file: &Path) -> Result<ExitCode> {
    let signal = load_wav_file(file, config.signal.sample_rate)
        .with_context(|| format!("loading {}", file.display()))?;
    let tracker = CentroidTracker::from_config(&config.centroid)?;
    let curve = tracker.compute(signal.samples(), signal.sample_rate())?;
    let report: SegmentationReport = CycleSegmenter::new(config.segmentation.clone())
        .segment_with_report(&curve, signal.duration_s());

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}

fn run_patient_id(filename: &str) -> ExitCode {
    match PatientId::from_filename(filename) {
        Ok(id) => {
            println!("{id}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log_input_error(&err, "patient-id");
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}

#[cfg(feature = "http")]
fn run_serve(mut config: AppConfig, addr: Option<SocketAddr>, model: Option<PathBuf>) -> Result<ExitCode> {
    use std::sync::Arc;

    use auscult::http::{serve_blocking, AppState};

    if let Some(model) = model {
        config.classifier.model_path = model;
    }
    let addr = match addr {
        Some(addr) => addr,
        None => config
            .server
            .addr
            .parse()
            .with_context(|| format!("parsing server address {}", config.server.addr))?,
    };

    let pipeline = DiagnosisPipeline::from_config(&config)
        .map_err(|err| logged(err, "serve"))
        .context("building diagnosis pipeline")?;
    let state = AppState::new(Arc::new(pipeline), &config.server);
    serve_blocking(state, addr)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(feature = "http"))]
fn run_serve(_config: AppConfig, _addr: Option<SocketAddr>, _model: Option<PathBuf>) -> Result<ExitCode> {
    anyhow::bail!("auscult_cli was built without the `http` feature")
}
