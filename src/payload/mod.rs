//! Inbound payload model.
//!
//! Producers send loosely-shaped JSON: a PWA recorder payload, a
//! multi-speaker transcript, or anything else. Classification is total and
//! field extraction is lenient, so a wrong-typed field degrades to its
//! documented default instead of failing the request.

use serde_json::Value;

/// Declared source string of the PWA recorder.
pub const PWA_SOURCE: &str = "PWA Meeting Recorder";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    PwaRecording,
    MultiSpeakerTranscript,
    Generic,
}

#[derive(Debug, Clone)]
pub enum Payload {
    Pwa(PwaRecording),
    Speakers(SpeakerTranscript),
    Generic(Value),
}

impl Payload {
    /// Route a decoded payload to its shape. First match wins:
    /// a declared PWA source, then a present non-null `speakers` key,
    /// then the generic fallback. Never fails.
    pub fn classify(value: Value) -> Payload {
        if value.get("source").and_then(Value::as_str) == Some(PWA_SOURCE) {
            Payload::Pwa(PwaRecording::from_value(&value))
        } else if value.get("speakers").map(|s| !s.is_null()).unwrap_or(false) {
            Payload::Speakers(SpeakerTranscript::from_value(&value))
        } else {
            Payload::Generic(value)
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Payload::Pwa(_) => SourceKind::PwaRecording,
            Payload::Speakers(_) => SourceKind::MultiSpeakerTranscript,
            Payload::Generic(_) => SourceKind::Generic,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PwaRecording {
    pub file_name: Option<String>,
    pub processing_time: Option<String>,
    pub duration: Option<String>,
    pub meeting_summary: Option<String>,
    pub key_points: Vec<String>,
    pub decisions: Vec<String>,
    pub action_items: Vec<String>,
    pub follow_up: Vec<String>,
    pub full_transcript: Option<String>,
}

impl PwaRecording {
    pub fn from_value(value: &Value) -> Self {
        Self {
            file_name: str_field(value, "fileName"),
            processing_time: str_field(value, "processingTime"),
            duration: str_field(value, "duration"),
            meeting_summary: str_field(value, "meetingSummary"),
            key_points: list_field(value, "keyPoints"),
            decisions: list_field(value, "decisions"),
            action_items: list_field(value, "actionItems"),
            follow_up: list_field(value, "followUp"),
            full_transcript: str_field(value, "fullTranscript"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpeakerTranscript {
    pub file_name: Option<String>,
    pub processing_time: Option<String>,
    pub duration: Option<String>,
    pub full_transcript: Option<String>,
    /// Speaker id to utterances, in payload order. A scalar value becomes a
    /// single utterance; a non-object `speakers` field yields no entries.
    pub speakers: Vec<(String, Vec<String>)>,
}

impl SpeakerTranscript {
    pub fn from_value(value: &Value) -> Self {
        let speakers = match value.get("speakers") {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(id, texts)| (id.clone(), utterances(texts)))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            file_name: str_field(value, "fileName"),
            processing_time: str_field(value, "processingTime"),
            duration: str_field(value, "duration"),
            full_transcript: str_field(value, "fullTranscript"),
            speakers,
        }
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Sequence field: keeps string entries (including blanks, filtered later at
/// formatting time), renders scalars as text, drops nested structures. A
/// missing or non-sequence value is an empty list.
fn list_field(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        _ => Vec::new(),
    }
}

fn utterances(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
