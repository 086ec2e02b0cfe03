//! Sync commands, in-flight requests, and their completions.
//!
//! A [`SyncCommand`] is what the state machine wants done. Dispatching it
//! yields a [`SyncRequest`] tagged with a fresh [`Seq`], and, once the
//! remote call settles, a [`Completion`] carrying the same tag back to the
//! reconciler.

use chrono::{DateTime, Utc};
use lifesync_types::{Seq, SnapshotPayload, StepAck, SyncKind};

use crate::board::BoardError;

/// Errors a remote operation can settle with.
///
/// None of these are fatal: they are reported to the display and the
/// scheduler keeps ticking.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The request never produced a usable HTTP response (connection
    /// failure, timeout, non-success status).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded into the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Outbound cells failed validation; nothing was sent.
    #[error("outbound cells rejected: {0}")]
    MalformedCells(BoardError),
}

/// A remote operation the engine should dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCommand {
    /// Read the server's board and metadata.
    FetchSnapshot,
    /// Advance the server's simulation one generation.
    RequestStep,
    /// Replace the server's board with these flattened cells.
    PushCells(Vec<u8>),
}

impl SyncCommand {
    /// The operation kind.
    pub const fn kind(&self) -> SyncKind {
        match self {
            Self::FetchSnapshot => SyncKind::FetchSnapshot,
            Self::RequestStep => SyncKind::RequestStep,
            Self::PushCells(_) => SyncKind::PushCells,
        }
    }
}

/// A successfully decoded response.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncResponse {
    /// Response of a fetch or a push.
    Snapshot(SnapshotPayload),
    /// Response of a step request.
    Step(StepAck),
}

/// Lifecycle of one dispatched request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// Dispatched, not yet settled.
    Pending,
    /// Settled with a decoded payload.
    Resolved(SyncResponse),
    /// Settled with an error.
    Failed(SyncError),
}

impl RequestOutcome {
    /// Whether the request is still in flight.
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// One dispatched remote operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRequest {
    /// Ordering tag allocated at dispatch.
    pub seq: Seq,
    /// Which operation.
    pub kind: SyncKind,
    /// Where it is in its lifecycle.
    pub outcome: RequestOutcome,
    /// When it was dispatched.
    pub dispatched_at: DateTime<Utc>,
}

impl SyncRequest {
    /// A freshly dispatched, pending request.
    pub fn pending(seq: Seq, kind: SyncKind) -> Self {
        Self {
            seq,
            kind,
            outcome: RequestOutcome::Pending,
            dispatched_at: Utc::now(),
        }
    }
}

/// The settled result of a request, routed back to the event loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Tag of the request that settled.
    pub seq: Seq,
    /// Which operation settled.
    pub kind: SyncKind,
    /// Decoded payload or the error it failed with.
    pub result: Result<SyncResponse, SyncError>,
}

impl Completion {
    /// Convert into the outcome stored in a request ledger.
    pub fn outcome(&self) -> RequestOutcome {
        match &self.result {
            Ok(response) => RequestOutcome::Resolved(response.clone()),
            Err(err) => RequestOutcome::Failed(err.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_kinds() {
        assert_eq!(SyncCommand::FetchSnapshot.kind(), SyncKind::FetchSnapshot);
        assert_eq!(SyncCommand::RequestStep.kind(), SyncKind::RequestStep);
        assert_eq!(SyncCommand::PushCells(vec![0]).kind(), SyncKind::PushCells);
    }

    #[test]
    fn completion_outcome_mirrors_result() {
        let failed = Completion {
            seq: Seq(3),
            kind: SyncKind::FetchSnapshot,
            result: Err(SyncError::Transport("connection refused".to_owned())),
        };
        assert_eq!(
            failed.outcome(),
            RequestOutcome::Failed(SyncError::Transport("connection refused".to_owned()))
        );

        let resolved = Completion {
            seq: Seq(4),
            kind: SyncKind::RequestStep,
            result: Ok(SyncResponse::Step(StepAck::default())),
        };
        assert!(!resolved.outcome().is_pending());
        assert!(SyncRequest::pending(Seq(5), SyncKind::PushCells).outcome.is_pending());
    }
}
