/// Stream event envelope and payload variants
///
/// Every frame on the streaming channel is `{kind, payload, timestamp,
/// session_id}`. The payload shape is fixed per kind, so dispatch on
/// [`EventKind`] is checked at compile time instead of going through an
/// untyped map.
use crate::domain::models::{
    ErrorEvent, MeetingSummary, ProgressUpdate, TaskItem, TranscriptSegment,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of event kinds the service emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    RecordingStart,
    RecordingStop,
    TranscriptSegment,
    SummaryGenerated,
    TaskExtracted,
    ProgressUpdate,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::RecordingStart,
        EventKind::RecordingStop,
        EventKind::TranscriptSegment,
        EventKind::SummaryGenerated,
        EventKind::TaskExtracted,
        EventKind::ProgressUpdate,
        EventKind::Error,
    ];
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::RecordingStart => write!(f, "recording-start"),
            EventKind::RecordingStop => write!(f, "recording-stop"),
            EventKind::TranscriptSegment => write!(f, "transcript-segment"),
            EventKind::SummaryGenerated => write!(f, "summary-generated"),
            EventKind::TaskExtracted => write!(f, "task-extracted"),
            EventKind::ProgressUpdate => write!(f, "progress-update"),
            EventKind::Error => write!(f, "error"),
        }
    }
}

/// Kind-tagged payload of one stream event
///
/// Recording start/stop payloads are service-defined and carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "kebab-case")]
pub enum EventPayload {
    RecordingStart(serde_json::Value),
    RecordingStop(serde_json::Value),
    TranscriptSegment(TranscriptSegment),
    SummaryGenerated(MeetingSummary),
    TaskExtracted(TaskItem),
    ProgressUpdate(ProgressUpdate),
    Error(ErrorEvent),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::RecordingStart(_) => EventKind::RecordingStart,
            EventPayload::RecordingStop(_) => EventKind::RecordingStop,
            EventPayload::TranscriptSegment(_) => EventKind::TranscriptSegment,
            EventPayload::SummaryGenerated(_) => EventKind::SummaryGenerated,
            EventPayload::TaskExtracted(_) => EventKind::TaskExtracted,
            EventPayload::ProgressUpdate(_) => EventKind::ProgressUpdate,
            EventPayload::Error(_) => EventKind::Error,
        }
    }
}

/// One asynchronously delivered notification bound to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(flatten)]
    pub payload: EventPayload,

    /// Emission time, service clock
    pub timestamp: DateTime<Utc>,

    /// Session this event belongs to
    pub session_id: String,
}

impl StreamEvent {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}
