//! Run control: whether synchronization drives simulation steps.
//!
//! Two states, two transitions, both triggered only by user intent. A
//! network result can never start or stop a run, and stopping never
//! cancels a request that is already in flight.

use chrono::{DateTime, Utc};
use lifesync_types::RunState;
use tracing::info;

/// The `Stopped` / `Running` state machine.
#[derive(Debug, Clone, Default)]
pub struct RunController {
    state: RunState,
    started_at: Option<DateTime<Utc>>,
}

impl RunController {
    /// Create a controller in the [`RunState::Stopped`] state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Whether step requests should be issued.
    pub const fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running)
    }

    /// When the current run began, if running.
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Enter [`RunState::Running`]. Returns the previous state.
    ///
    /// The caller pushes the current board right after, so starting while
    /// already running still restarts the server from this board.
    pub fn start(&mut self) -> RunState {
        let previous = self.state;
        self.state = RunState::Running;
        self.started_at = Some(Utc::now());
        info!(previous = previous.as_str(), "run started");
        previous
    }

    /// Enter [`RunState::Stopped`]. Returns the previous state.
    pub fn stop(&mut self) -> RunState {
        let previous = self.state;
        self.state = RunState::Stopped;
        self.started_at = None;
        info!(previous = previous.as_str(), "run stopped");
        previous
    }
}
