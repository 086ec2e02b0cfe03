//! Sequence-tagged dispatch of the three remote operations.
//!
//! [`SyncClient::dispatch`] does everything that must happen *now*
//! (validation, sequence allocation) synchronously, and hands back the
//! network part as a `'static` future the caller can spawn. The future
//! always settles into a [`Completion`]; it never panics into the caller
//! and never retries.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use lifesync_core::board::validate_flat;
use lifesync_core::config::{GridConfig, ServerConfig};
use lifesync_core::request::{Completion, SyncCommand, SyncError, SyncRequest, SyncResponse};
use lifesync_core::sequence::Sequencer;
use lifesync_types::{SetCellsBody, SnapshotPayload, StepAck, SyncKind};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::transport::Transport;

/// The future that settles a dispatched request.
pub type CompletionFuture = Pin<Box<dyn Future<Output = Completion> + Send + 'static>>;

/// Server paths for the three operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Snapshot fetch (GET).
    pub data: String,
    /// Step request (GET).
    pub step: String,
    /// Cell upload (POST).
    pub set_cells: String,
}

impl Endpoints {
    /// Paths taken from server configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            data: config.data_path.clone(),
            step: config.step_path.clone(),
            set_cells: config.set_cells_path.clone(),
        }
    }

    /// The `/cmd/...` layout some deployments use for commands.
    pub fn cmd_prefixed() -> Self {
        Self {
            data: "/data".to_owned(),
            step: "/cmd/step".to_owned(),
            set_cells: "/cmd/setcells".to_owned(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

/// A request that has been tagged and is ready to go out.
pub struct Dispatched {
    /// The pending request record.
    pub request: SyncRequest,
    /// Settles into the request's [`Completion`].
    pub completion: CompletionFuture,
}

impl core::fmt::Debug for Dispatched {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatched")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Issues sync commands over a [`Transport`].
#[derive(Debug)]
pub struct SyncClient<T> {
    transport: Arc<T>,
    endpoints: Endpoints,
    cell_count: usize,
    sequencer: Sequencer,
}

impl<T> Clone for SyncClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            endpoints: self.endpoints.clone(),
            cell_count: self.cell_count,
            sequencer: self.sequencer.clone(),
        }
    }
}

impl<T: Transport> SyncClient<T> {
    /// Create a client for a board of `grid` size.
    ///
    /// `sequencer` must be shared with whatever records local edits.
    pub fn new(transport: T, endpoints: Endpoints, grid: &GridConfig, sequencer: Sequencer) -> Self {
        Self {
            transport: Arc::new(transport),
            endpoints,
            cell_count: grid.cell_count(),
            sequencer,
        }
    }

    /// The sequence counter dispatches are tagged from.
    pub const fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Tag `command` with a fresh sequence number and prepare its call.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MalformedCells`] if a push carries the wrong
    /// number of cells or a value other than 0 or 1. In that case no
    /// sequence number is allocated and the transport is never touched.
    pub fn dispatch(&self, command: SyncCommand) -> Result<Dispatched, SyncError> {
        match command {
            SyncCommand::FetchSnapshot => Ok(self.fetch_snapshot()),
            SyncCommand::RequestStep => Ok(self.request_step()),
            SyncCommand::PushCells(cells) => self.push_cells(cells),
        }
    }

    /// Read the server's board and metadata.
    pub fn fetch_snapshot(&self) -> Dispatched {
        let request = self.tag(SyncKind::FetchSnapshot);
        let transport = Arc::clone(&self.transport);
        let path = self.endpoints.data.clone();
        let completion = settle(request.seq, request.kind, async move {
            decode::<SnapshotPayload>(transport.get(&path).await?).map(SyncResponse::Snapshot)
        });
        Dispatched {
            request,
            completion,
        }
    }

    /// Ask the server to advance one generation.
    pub fn request_step(&self) -> Dispatched {
        let request = self.tag(SyncKind::RequestStep);
        let transport = Arc::clone(&self.transport);
        let path = self.endpoints.step.clone();
        let completion = settle(request.seq, request.kind, async move {
            decode::<StepAck>(transport.get(&path).await?).map(SyncResponse::Step)
        });
        Dispatched {
            request,
            completion,
        }
    }

    /// Replace the server's board with `cells`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MalformedCells`] before anything is sent if
    /// `cells` does not describe a full board.
    pub fn push_cells(&self, cells: Vec<u8>) -> Result<Dispatched, SyncError> {
        validate_flat(&cells, self.cell_count).map_err(SyncError::MalformedCells)?;
        let body = serde_json::to_value(SetCellsBody { cells })
            .map_err(|e| SyncError::Decode(format!("encoding cells failed: {e}")))?;

        let request = self.tag(SyncKind::PushCells);
        let transport = Arc::clone(&self.transport);
        let path = self.endpoints.set_cells.clone();
        let completion = settle(request.seq, request.kind, async move {
            decode::<SnapshotPayload>(transport.post(&path, body).await?)
                .map(SyncResponse::Snapshot)
        });
        Ok(Dispatched {
            request,
            completion,
        })
    }

    fn tag(&self, kind: SyncKind) -> SyncRequest {
        let seq = self.sequencer.next();
        debug!(seq = %seq, kind = kind.as_str(), "dispatching");
        SyncRequest::pending(seq, kind)
    }
}

fn settle<F>(seq: lifesync_types::Seq, kind: SyncKind, call: F) -> CompletionFuture
where
    F: Future<Output = Result<SyncResponse, SyncError>> + Send + 'static,
{
    Box::pin(async move {
        Completion {
            seq,
            kind,
            result: call.await,
        }
    })
}

fn decode<D: DeserializeOwned>(value: serde_json::Value) -> Result<D, SyncError> {
    serde_json::from_value(value).map_err(|e| SyncError::Decode(e.to_string()))
}
