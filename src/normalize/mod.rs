//! Per-source normalization into canonical rows.
//!
//! Each normalizer turns one payload into the header list and data rows of
//! its destination table. Column order is a permanent contract per table
//! name: headers are written once when a table is first provisioned and the
//! row builders here must never drift from them.

use crate::payload::{Payload, PwaRecording, SpeakerTranscript};
use crate::store::{Cell, Row};
use chrono::{DateTime, Local};
use serde_json::Value;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const MEETING_HEADERS: [&str; 11] = [
    "recordedAt",
    "fileName",
    "processedAt",
    "duration",
    "summary",
    "keyPoints",
    "decisions",
    "actionItems",
    "followUp",
    "fullTranscript",
    "charCount",
];

pub const TRANSCRIPT_HEADERS: [&str; 8] = [
    "recordedAt",
    "fileName",
    "processedAt",
    "speakerLabel",
    "spokenText",
    "fullTranscript",
    "durationSeconds",
    "charCount",
];

pub const GENERIC_HEADERS: [&str; 2] = ["recordedAt", "rawPayload"];

const DEFAULT_RECORDING_NAME: &str = "untitled recording";
const DEFAULT_FILE_NAME: &str = "unknown file";
const FULL_TRANSCRIPT_LABEL: &str = "Full Transcript";

/// Output of a normalizer: the destination table's header contract plus
/// zero or more data rows.
#[derive(Debug)]
pub struct Normalized {
    pub headers: &'static [&'static str],
    pub rows: Vec<Row>,
}

pub fn format_timestamp(now: DateTime<Local>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Normalize a classified payload. Total: every shape yields a well-formed
/// result, and only an empty `speakers` transcript yields zero rows.
pub fn normalize(payload: &Payload, recorded_at: &str) -> Normalized {
    match payload {
        Payload::Pwa(rec) => normalize_pwa(rec, recorded_at),
        Payload::Speakers(tx) => normalize_speakers(tx, recorded_at),
        Payload::Generic(value) => normalize_generic(value, recorded_at),
    }
}

fn normalize_pwa(rec: &PwaRecording, recorded_at: &str) -> Normalized {
    let transcript = rec.full_transcript.clone().unwrap_or_default();
    let char_count = char_count(&transcript);

    let row: Row = vec![
        Cell::from(recorded_at),
        Cell::from(rec.file_name.as_deref().unwrap_or(DEFAULT_RECORDING_NAME)),
        Cell::from(rec.processing_time.as_deref().unwrap_or(recorded_at)),
        Cell::from(rec.duration.as_deref().unwrap_or("")),
        Cell::from(rec.meeting_summary.as_deref().unwrap_or("")),
        Cell::from(join_list(&rec.key_points)),
        Cell::from(join_list(&rec.decisions)),
        Cell::from(join_list(&rec.action_items)),
        Cell::from(join_list(&rec.follow_up)),
        Cell::from(transcript),
        Cell::Int(char_count),
    ];

    Normalized {
        headers: &MEETING_HEADERS,
        rows: vec![row],
    }
}

fn normalize_speakers(tx: &SpeakerTranscript, recorded_at: &str) -> Normalized {
    let file_name = tx.file_name.as_deref().unwrap_or(DEFAULT_FILE_NAME);
    let processed_at = tx.processing_time.as_deref().unwrap_or("");
    let duration = tx.duration.as_deref().unwrap_or("");

    let mut rows: Vec<Row> = Vec::new();

    for (id, utterances) in &tx.speakers {
        let spoken = utterances.join("\n");
        let count = char_count(&spoken);
        rows.push(vec![
            Cell::from(recorded_at),
            Cell::from(file_name),
            Cell::from(processed_at),
            Cell::from(format!("Speaker {}", id)),
            Cell::from(spoken),
            Cell::empty(),
            Cell::from(duration),
            Cell::Int(count),
        ]);
    }

    // A full transcript rides along as one extra row in its own column.
    if let Some(transcript) = &tx.full_transcript {
        let count = char_count(transcript);
        rows.push(vec![
            Cell::from(recorded_at),
            Cell::from(file_name),
            Cell::from(processed_at),
            Cell::from(FULL_TRANSCRIPT_LABEL),
            Cell::empty(),
            Cell::from(transcript.as_str()),
            Cell::from(duration),
            Cell::Int(count),
        ]);
    }

    Normalized {
        headers: &TRANSCRIPT_HEADERS,
        rows,
    }
}

fn normalize_generic(value: &Value, recorded_at: &str) -> Normalized {
    // Value's serialization is lossless and key-order preserving, so an
    // unrecognized payload survives storage intact.
    let row: Row = vec![Cell::from(recorded_at), Cell::from(value.to_string())];

    Normalized {
        headers: &GENERIC_HEADERS,
        rows: vec![row],
    }
}

/// Join list entries with a bullet-prefixed newline separator, dropping
/// blank and whitespace-only entries.
pub fn join_list(items: &[String]) -> String {
    items
        .iter()
        .filter(|item| !item.trim().is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("\n• ")
}

pub fn char_count(text: &str) -> i64 {
    text.chars().count() as i64
}
