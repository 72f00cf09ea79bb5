/// Session, transcript and summary records
///
/// Field names match the service's JSON wire format exactly.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of recognized speech text
///
/// Immutable once received; the coordinator only ever appends these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,

    /// Recognition confidence, 0.0 to 1.0
    #[serde(default)]
    pub confidence: f32,

    /// Speaker label if diarization is available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,

    /// Offset into the audio in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
}

/// One action item extracted from the meeting
///
/// Opaque payload: the service owns the business rules, the client only
/// checks field presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskItem {
    pub task: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,

    #[serde(default)]
    pub description: String,

    /// "high" / "medium" / "low"
    #[serde(default = "default_priority")]
    pub priority: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// "pending" / "in_progress" / "completed"
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_priority() -> String {
    "medium".to_string()
}

fn default_status() -> String {
    "pending".to_string()
}

/// The latest generated synthesis of a session's transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingSummary {
    pub session_id: String,
    pub summary_text: String,

    #[serde(default)]
    pub tasks: Vec<TaskItem>,

    #[serde(default)]
    pub key_points: Vec<String>,

    #[serde(default)]
    pub decisions: Vec<String>,

    pub generated_at: DateTime<Utc>,
}

/// Full snapshot of a remote session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,

    #[serde(default)]
    pub is_recording: bool,

    pub start_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub transcript_segments: Vec<TranscriptSegment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_summary: Option<MeetingSummary>,

    #[serde(default = "default_participant_count")]
    pub participant_count: u32,
}

fn default_participant_count() -> u32 {
    1
}

/// Progress of a long-running service-side stage (transcription, summary, export)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub module: String,

    /// Percentage, 0.0 to 100.0
    pub progress: f32,

    #[serde(default)]
    pub message: String,

    /// "running" / "completed" / "error"
    #[serde(default)]
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error payload delivered over the event stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}
