//! HTTP surface for the ingestion service.
//!
//! Two endpoints only: `POST /ingest` (also accepted at `/`) takes a raw
//! JSON body and always answers 200 with the structured envelope, and
//! `GET /` is a read-only status probe that touches no storage.

use crate::ingest::{IngestResponse, IngestService};
use anyhow::Result;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;

pub struct ApiServer {
    port: u16,
    service: Arc<IngestService>,
}

impl ApiServer {
    pub fn new(service: Arc<IngestService>, port: u16) -> Self {
        Self { port, service }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            .route("/", get(status).post(ingest))
            .route("/ingest", post(ingest))
            .with_state(self.service)
            .layer(ServiceBuilder::new());

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("API server listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  GET  /        - Service status probe");
        info!("  POST /ingest  - Ingest a recording payload");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "status": "ready",
        "message": "meetsink meeting-record ingestion service",
        "version": env!("CARGO_PKG_VERSION"),
        "supportedSources": IngestService::supported_sources(),
    }))
}

/// Ingest handler. Transport always sees 200 with a well-formed body; the
/// success/error distinction lives in the envelope's `status` field.
async fn ingest(State(service): State<Arc<IngestService>>, body: String) -> Json<IngestResponse> {
    Json(service.ingest(&body))
}
