//! meetsink: self-hosted ingestion service for meeting-recording payloads.
//!
//! Accepts JSON from a PWA recorder, a multi-speaker transcription service,
//! or unknown callers, normalizes each shape into fixed-column rows,
//! appends them to a tabular store, and keeps a rolling aggregate ledger.

pub mod aggregate;
pub mod api;
pub mod app;
pub mod config;
pub mod global;
pub mod ingest;
pub mod normalize;
pub mod payload;
pub mod provision;
pub mod store;
