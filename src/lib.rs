//! MeetSync client
//!
//! Client library for the MeetSync meeting-assistant service. It keeps a
//! local view of a remote recording session consistent across two transport
//! channels: request/response HTTP calls for lifecycle and recording control,
//! and a persistent WebSocket delivering transcript and summary events.
//!
//! Three layers compose the client:
//! - the [`SessionApi`](ports::SessionApi) port with its reqwest adapter,
//!   one call per service operation, no retries;
//! - the [`StreamClient`], which owns the event subscriptions and the
//!   reconnect policy (linear backoff, bounded attempts);
//! - the [`SessionCoordinator`], the stateful facade UI layers consume.
//!
//! ```no_run
//! use meetsync_client::{ClientConfig, SessionCoordinator};
//!
//! # async fn run() -> meetsync_client::Result<()> {
//! let coordinator = SessionCoordinator::from_config(&ClientConfig::default())?;
//! coordinator.create_session().await?;
//! coordinator.start_recording().await?;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod ports;
pub mod state;
pub mod stream;

pub use config::ClientConfig;
pub use coordinator::SessionCoordinator;
pub use domain::{
    ErrorEvent, EventKind, EventPayload, MeetingSummary, ProgressUpdate, SessionState,
    StreamEvent, TaskItem, TranscriptSegment,
};
pub use error::{ClientError, Result};
pub use state::{ConnectionState, SharedConnectionState};
pub use stream::{HandlerId, StreamClient, StreamStatus};
