/// Domain layer - wire-level records shared with the MeetSync service
///
/// These models mirror the service's JSON payloads and are transport-agnostic.
pub mod events;
pub mod models;

pub use events::{EventKind, EventPayload, StreamEvent};
pub use models::{
    ErrorEvent, MeetingSummary, ProgressUpdate, SessionState, TaskItem, TranscriptSegment,
};
