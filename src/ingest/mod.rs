//! Ingestion orchestrator.
//!
//! Wires classifier → normalizer → provisioner → append → aggregate update,
//! and converts every failure into the structured response envelope. The
//! caller (HTTP layer or test) always gets a well-formed response; internal
//! faults never propagate as transport-level failures.

use crate::aggregate;
use crate::config::{Config, TableNames};
use crate::normalize::{self, format_timestamp};
use crate::payload::{Payload, SourceKind};
use crate::provision;
use crate::store::{SqliteStore, TableStore};
use chrono::Local;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("storage is not configured: {0}")]
    Configuration(String),
    #[error("unable to parse received data: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("storage access failed: {0:#}")]
    StorageAccess(anyhow::Error),
    /// Reserved: normalizers are total today and never construct this.
    #[error("normalization failed: {0}")]
    Normalization(String),
}

/// Response envelope returned for every ingest attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_url: Option<String>,
}

impl IngestResponse {
    pub fn success(message: impl Into<String>, location: String) -> Self {
        Self {
            status: "success",
            message: message.into(),
            sheet_url: Some(location),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            sheet_url: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

impl From<IngestError> for IngestResponse {
    fn from(err: IngestError) -> Self {
        IngestResponse::error(err.to_string())
    }
}

pub struct IngestService {
    store: Arc<dyn TableStore>,
    tables: TableNames,
    // Held across the ledger's whole read-modify-write span; appends rely on
    // the store's atomic append primitive instead.
    aggregate_lock: Mutex<()>,
}

impl IngestService {
    pub fn new(store: Arc<dyn TableStore>, tables: TableNames) -> Self {
        Self {
            store,
            tables,
            aggregate_lock: Mutex::new(()),
        }
    }

    /// Build the production service from config: validates the storage
    /// identifier once at startup and opens the durable backend.
    pub fn from_config(config: &Config) -> Result<Self, IngestError> {
        config
            .validate()
            .map_err(|e| IngestError::Configuration(format!("{e:#}")))?;

        let store =
            SqliteStore::open(Path::new(&config.storage.path)).map_err(IngestError::StorageAccess)?;

        Ok(Self::new(Arc::new(store), config.tables.clone()))
    }

    /// Ingest one raw request body. Always returns a well-formed response.
    pub fn ingest(&self, raw: &str) -> IngestResponse {
        match self.try_ingest(raw) {
            Ok(response) => response,
            Err(err) => {
                error!("ingest failed: {}", err);
                err.into()
            }
        }
    }

    fn try_ingest(&self, raw: &str) -> Result<IngestResponse, IngestError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let payload = Payload::classify(value);
        let kind = payload.kind();
        debug!("classified payload as {:?}", kind);

        let now = Local::now();
        let recorded_at = format_timestamp(now);
        let normalized = normalize::normalize(&payload, &recorded_at);

        let target = match kind {
            SourceKind::PwaRecording => &self.tables.meeting,
            SourceKind::MultiSpeakerTranscript => &self.tables.transcript,
            SourceKind::Generic => &self.tables.generic,
        };

        let table = provision::ensure_table(self.store.as_ref(), target, normalized.headers)
            .map_err(IngestError::StorageAccess)?;
        provision::append(table.as_ref(), &normalized.rows).map_err(IngestError::StorageAccess)?;

        // Only the PWA recorder feeds the ledger. A failure here is reported
        // but never fails the ingest: the appended record is the source of
        // truth, aggregates are best-effort.
        if let Payload::Pwa(rec) = &payload {
            let _guard = self
                .aggregate_lock
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Err(err) = aggregate::update(self.store.as_ref(), &self.tables.aggregate, rec, now)
            {
                warn!("aggregate update failed: {:#}", err);
            }
        }

        Ok(IngestResponse::success(
            "data written to the record store",
            self.store.location(),
        ))
    }

    /// Read-only service description for the status probe.
    pub fn supported_sources() -> [&'static str; 3] {
        ["PWA Meeting Recorder", "AssemblyAI", "Generic"]
    }

    pub fn store(&self) -> &dyn TableStore {
        self.store.as_ref()
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Table};

    fn service() -> (IngestService, MemoryStore) {
        let store = MemoryStore::new();
        let service = IngestService::new(Arc::new(store.clone()), TableNames::default());
        (service, store)
    }

    #[test]
    fn malformed_body_yields_error_envelope() {
        let (service, _) = service();
        let response = service.ingest("not json {");
        assert_eq!(response.status, "error");
        assert!(response.message.contains("unable to parse"));
        assert!(response.sheet_url.is_none());
    }

    #[test]
    fn success_envelope_carries_location() {
        let (service, _) = service();
        let response = service.ingest(r#"{"source":"PWA Meeting Recorder"}"#);
        assert!(response.is_success());
        assert_eq!(response.sheet_url.as_deref(), Some("memory://meetsink"));
    }

    #[test]
    fn placeholder_config_is_a_configuration_error() {
        let config = Config::default();
        let err = IngestService::from_config(&config).err().unwrap();
        assert!(matches!(err, IngestError::Configuration(_)));

        let response: IngestResponse = err.into();
        assert_eq!(response.status, "error");
        assert!(response.message.contains("not configured"));
    }

    #[test]
    fn generic_payload_lands_in_generic_table() {
        let (service, store) = service();
        let response = service.ingest(r#"{"foo": 1}"#);
        assert!(response.is_success());

        let generic = store.open_table("generic_records").unwrap();
        assert_eq!(generic.row_count().unwrap(), 2); // header + one row

        // Nothing should have touched the other tables.
        let meeting = store.open_table("meeting_records").unwrap();
        assert_eq!(meeting.row_count().unwrap(), 0);
    }
}
