use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tokio::sync::Semaphore;
use tower::limit::ConcurrencyLimitLayer;

use crate::analysis::vote::Outcome;
use crate::config::ServerConfig;
use crate::error::{log_pipeline_error, ErrorCode, PipelineError};
use crate::patient::PatientId;
use crate::pipeline::DiagnosisPipeline;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<DiagnosisPipeline>,
    /// Held by a diagnosis until its blocking task returns, even after a timeout
    diagnosis_slots: Arc<Semaphore>,
    started_at: Instant,
    request_timeout: Duration,
    upload_limit_bytes: usize,
    max_concurrent_requests: usize,
}

impl AppState {
    pub fn new(pipeline: Arc<DiagnosisPipeline>, config: &ServerConfig) -> Self {
        let max_concurrent_requests = config.max_concurrent_requests.max(1);
        Self {
            pipeline,
            diagnosis_slots: Arc::new(Semaphore::new(max_concurrent_requests)),
            started_at: Instant::now(),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            upload_limit_bytes: config.upload_limit_bytes,
            max_concurrent_requests,
        }
    }
}

/// HTTP error variants mapped to JSON responses.
#[derive(Debug)]
pub enum HttpServerError {
    BadRequest(String),
    PayloadTooLarge,
    Internal(String),
}

impl From<PipelineError> for HttpServerError {
    fn from(err: PipelineError) -> Self {
        log_pipeline_error(&err, "POST /predict");
        if err.is_client_error() {
            Self::BadRequest(err.message())
        } else {
            Self::Internal(err.message())
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "upload exceeds the size limit".to_string(),
            ),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Health endpoint response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_ms: u64,
}

/// Predict endpoint response payload.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub outcome: Outcome,
    pub confidence_percent: Option<f64>,
    pub message: String,
    pub patient_id: PatientId,
    pub segment_count: usize,
}

/// Build the Axum router with all handlers.
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.upload_limit_bytes;
    let max_concurrent = state.max_concurrent_requests;

    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(ConcurrencyLimitLayer::new(max_concurrent))
        .with_state(state)
}

/// Run the HTTP server loop until Ctrl-C.
pub async fn run_http_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", addr))?;
    let router = build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("[HTTP] shutdown requested");
            }
        })
        .await
        .context("serving HTTP router")?;
    Ok(())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_ms: state.started_at.elapsed().as_millis() as u64,
    })
}

pub async fn predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, HttpServerError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| HttpServerError::BadRequest("file field has no filename".to_string()))?;
        let bytes = field.bytes().await.map_err(map_multipart_error)?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or_else(|| {
        HttpServerError::BadRequest("missing multipart field 'file'".to_string())
    })?;
    let patient_id = PatientId::from_filename(&filename).map_err(PipelineError::from)?;
    log::info!(
        "[HTTP] diagnosing {} ({} bytes) for patient {}",
        filename,
        bytes.len(),
        patient_id
    );

    let pipeline = Arc::clone(&state.pipeline);
    let slots = Arc::clone(&state.diagnosis_slots);
    let diagnosis = async move {
        let permit = match slots.acquire_owned().await {
            Ok(permit) => permit,
            Err(err) => {
                return Err(HttpServerError::Internal(format!(
                    "diagnosis slots unavailable: {}",
                    err
                )))
            }
        };
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            pipeline.diagnose_wav(&bytes)
        })
        .await
        .map_err(|err| HttpServerError::Internal(format!("diagnosis task failed: {}", err)))
    };

    let report = match tokio::time::timeout(state.request_timeout, diagnosis).await {
        Ok(Ok(result)) => result?,
        Ok(Err(err)) => return Err(err),
        Err(_) => {
            return Err(PipelineError::Timeout {
                limit_ms: state.request_timeout.as_millis() as u64,
            }
            .into())
        }
    };

    Ok(Json(PredictResponse {
        outcome: report.verdict.outcome,
        confidence_percent: report.verdict.confidence_percent,
        message: report.verdict.message.clone(),
        patient_id,
        segment_count: report.segment_count(),
    }))
}

fn map_multipart_error(err: MultipartError) -> HttpServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        HttpServerError::PayloadTooLarge
    } else {
        HttpServerError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Label, SegmentClassifier};
    use crate::config::AppConfig;
    use crate::testing::{FailingClassifier, HeartbeatSpec, ScriptedClassifier};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const BOUNDARY: &str = "auscult-test-boundary";

    fn make_router_with(classifier: Arc<dyn SegmentClassifier>, server: ServerConfig) -> Router {
        let pipeline = DiagnosisPipeline::new(&AppConfig::default(), classifier).unwrap();
        build_router(AppState::new(Arc::new(pipeline), &server))
    }

    fn make_router(classifier: Arc<dyn SegmentClassifier>) -> Router {
        make_router_with(classifier, ServerConfig::default())
    }

    fn multipart_body(field: &str, filename: Option<&str>, payload: &[u8]) -> Vec<u8> {
        let disposition = match filename {
            Some(name) => format!("form-data; name=\"{field}\"; filename=\"{name}\""),
            None => format!("form-data; name=\"{field}\""),
        };
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: audio/wav\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn predict_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("predict request")
    }

    async fn response_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body bytes");
        let json = serde_json::from_slice::<Value>(&bytes).expect("JSON body");
        (status, json)
    }

    struct SlowClassifier;

    impl SegmentClassifier for SlowClassifier {
        fn predict(
            &self,
            features: &[crate::analysis::features::FeatureVector],
        ) -> Result<Vec<Label>, crate::error::ClassifierError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(vec![Label::Negative; features.len()])
        }
    }

    /// Sleeps in `predict` and records how many calls overlapped
    #[derive(Default)]
    struct OverlapClassifier {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl SegmentClassifier for OverlapClassifier {
        fn predict(
            &self,
            features: &[crate::analysis::features::FeatureVector],
        ) -> Result<Vec<Label>, crate::error::ClassifierError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(300));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![Label::Negative; features.len()])
        }
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, json) = response_json(
            make_router(Arc::new(ScriptedClassifier::default()))
                .oneshot(
                    Request::builder()
                        .uri("/health")
                        .body(Body::empty())
                        .expect("health request"),
                )
                .await
                .expect("health call"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert!(json["uptime_ms"].is_u64());
    }

    #[tokio::test]
    async fn predict_returns_verdict() {
        let body = multipart_body("file", Some("AB12_foo.wav"), &HeartbeatSpec::default().wav_bytes());
        let (status, json) = response_json(
            make_router(Arc::new(ScriptedClassifier::always(Label::Positive)))
                .oneshot(predict_request(body))
                .await
                .expect("predict call"),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["outcome"], "positive");
        assert_eq!(json["confidence_percent"], 100.0);
        assert_eq!(json["message"], "100.00% sure that the patient is sick");
        assert_eq!(json["patient_id"], 12);
        assert_eq!(json["segment_count"], 3);
    }

    #[tokio::test]
    async fn predict_short_recording_is_undetermined() {
        let wav = crate::testing::wav_bytes(&vec![0.01; 8000], 4000);
        let (status, json) = response_json(
            make_router(Arc::new(ScriptedClassifier::always(Label::Positive)))
                .oneshot(predict_request(multipart_body("file", Some("034_bar.wav"), &wav)))
                .await
                .expect("predict call"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["outcome"], "undetermined");
        assert!(json["confidence_percent"].is_null());
        assert_eq!(json["patient_id"], 34);
        assert_eq!(json["segment_count"], 0);
    }

    #[tokio::test]
    async fn predict_requires_file_field() {
        let body = multipart_body("other", Some("AB12_foo.wav"), b"ignored");
        let (status, json) = response_json(
            make_router(Arc::new(ScriptedClassifier::default()))
                .oneshot(predict_request(body))
                .await
                .expect("predict call"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "missing multipart field 'file'");
    }

    #[tokio::test]
    async fn predict_rejects_bad_identifier() {
        let body = multipart_body("file", Some("recording.wav"), &HeartbeatSpec::default().wav_bytes());
        let (status, json) = response_json(
            make_router(Arc::new(ScriptedClassifier::default()))
                .oneshot(predict_request(body))
                .await
                .expect("predict call"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("recording.wav"));
    }

    #[tokio::test]
    async fn predict_rejects_undecodable_audio() {
        let body = multipart_body("file", Some("AB12_foo.wav"), b"not a wav file at all");
        let (status, _) = response_json(
            make_router(Arc::new(ScriptedClassifier::default()))
                .oneshot(predict_request(body))
                .await
                .expect("predict call"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn classifier_failure_is_server_error() {
        let body = multipart_body("file", Some("AB12_foo.wav"), &HeartbeatSpec::default().wav_bytes());
        let (status, json) = response_json(
            make_router(Arc::new(FailingClassifier))
                .oneshot(predict_request(body))
                .await
                .expect("predict call"),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("scripted failure"));
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let server = ServerConfig {
            upload_limit_bytes: 1024,
            ..ServerConfig::default()
        };
        let body = multipart_body("file", Some("AB12_foo.wav"), &HeartbeatSpec::default().wav_bytes());
        let response = make_router_with(Arc::new(ScriptedClassifier::default()), server)
            .oneshot(predict_request(body))
            .await
            .expect("predict call");

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn slow_diagnosis_times_out() {
        let server = ServerConfig {
            request_timeout_ms: 20,
            ..ServerConfig::default()
        };
        let body = multipart_body("file", Some("AB12_foo.wav"), &HeartbeatSpec::default().wav_bytes());
        let (status, json) = response_json(
            make_router_with(Arc::new(SlowClassifier), server)
                .oneshot(predict_request(body))
                .await
                .expect("predict call"),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("20"));
    }

    #[tokio::test]
    async fn timed_out_diagnoses_keep_their_slot() {
        let classifier = Arc::new(OverlapClassifier::default());
        let server = ServerConfig {
            max_concurrent_requests: 1,
            request_timeout_ms: 100,
            ..ServerConfig::default()
        };
        let router = make_router_with(classifier.clone(), server);
        let wav = HeartbeatSpec::default().wav_bytes();

        for _ in 0..4 {
            let body = multipart_body("file", Some("AB12_foo.wav"), &wav);
            let response = router
                .clone()
                .oneshot(predict_request(body))
                .await
                .expect("predict call");
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }

        // let the abandoned blocking tasks drain before reading the peak
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(classifier.peak.load(Ordering::SeqCst), 1);
        assert_eq!(classifier.active.load(Ordering::SeqCst), 0);
    }
}
