//! Read-only projection of synchronization state for the display layer.
//!
//! The display never writes back: it receives a fresh [`DisplaySnapshot`]
//! whenever the engine's state changes and renders it as it sees fit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::wire::RemoteMeta;

/// Whether synchronization is driving simulation steps or only observing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum RunState {
    /// Only snapshots are fetched.
    #[default]
    Stopped,
    /// Step requests are issued alongside snapshot fetches.
    Running,
}

impl RunState {
    /// Lowercase label for logs and status lines.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
        }
    }
}

/// The three remote operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SyncKind {
    /// Read the server's board and metadata.
    FetchSnapshot,
    /// Ask the server to advance the simulation one generation.
    RequestStep,
    /// Replace the server's board with a locally edited one.
    PushCells,
}

impl SyncKind {
    /// Snake-case label for structured log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FetchSnapshot => "fetch_snapshot",
            Self::RequestStep => "request_step",
            Self::PushCells => "push_cells",
        }
    }
}

impl core::fmt::Display for SyncKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the display layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DisplaySnapshot {
    /// Cell values indexed `board[i][j]`.
    pub board: Vec<Vec<u8>>,
    /// Current run state.
    pub run_state: RunState,
    /// Metadata from the most recently applied response.
    pub last_meta: Option<RemoteMeta>,
    /// Most recent non-fatal error, cleared by the next successful apply.
    pub last_error: Option<String>,
    /// Most recent step acknowledgement text.
    pub last_status: Option<String>,
    /// Seconds until the next automatic synchronization.
    pub countdown_secs: u64,
    /// Current spacing between automatic synchronizations.
    pub interval_secs: u64,
    /// Requests dispatched but not yet resolved.
    pub pending_requests: u64,
    /// Responses discarded because a newer one was already applied.
    pub stale_discarded: u64,
    /// When the current run started; `None` while stopped.
    pub running_since: Option<DateTime<Utc>>,
    /// When this snapshot was produced.
    pub updated_at: DateTime<Utc>,
}

impl DisplaySnapshot {
    /// Number of live cells on the projected board.
    pub fn population(&self) -> usize {
        self.board
            .iter()
            .map(|column| column.iter().filter(|&&cell| cell == 1).count())
            .sum()
    }
}
