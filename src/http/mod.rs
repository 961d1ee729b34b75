//! Upload service for recordings.
//!
//! Exposes `POST /predict` (multipart WAV upload) and `GET /health` over Axum.
//! Each request decodes and diagnoses its recording on a blocking thread; the
//! pipeline and its classifier are shared read-only between requests.

mod routes;

pub use routes::{
    build_router, run_http_server, AppState, HealthResponse, HttpServerError, PredictResponse,
};

use std::net::SocketAddr;

use anyhow::Context;

/// Run the HTTP server on a dedicated multi-threaded runtime until Ctrl-C
pub fn serve_blocking(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime for HTTP server")?;

    log::info!("[HTTP] binding {}", addr);
    runtime.block_on(run_http_server(state, addr))
}
