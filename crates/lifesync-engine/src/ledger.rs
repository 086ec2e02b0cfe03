//! Bookkeeping for requests that are in flight.
//!
//! The ledger never times anything out. A request whose transport never
//! settles simply stays pending, and the pending count keeps showing it.

use std::collections::BTreeMap;

use lifesync_core::request::{Completion, RequestOutcome, SyncRequest};
use lifesync_types::Seq;
use tracing::debug;

/// In-flight requests keyed by sequence number, plus lifetime totals.
#[derive(Debug, Clone, Default)]
pub struct RequestLedger {
    pending: BTreeMap<Seq, SyncRequest>,
    dispatched: u64,
    resolved: u64,
    failed: u64,
}

impl RequestLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly dispatched request.
    pub fn track(&mut self, request: SyncRequest) {
        self.dispatched = self.dispatched.saturating_add(1);
        let _ = self.pending.insert(request.seq, request);
    }

    /// Close out the request a completion belongs to.
    ///
    /// Returns the settled request, or `None` if it was not being tracked.
    pub fn settle(&mut self, completion: &Completion) -> Option<SyncRequest> {
        let mut request = self.pending.remove(&completion.seq)?;
        request.outcome = completion.outcome();
        match request.outcome {
            RequestOutcome::Failed(_) => self.failed = self.failed.saturating_add(1),
            RequestOutcome::Resolved(_) | RequestOutcome::Pending => {
                self.resolved = self.resolved.saturating_add(1);
            }
        }
        debug!(
            seq = %request.seq,
            kind = request.kind.as_str(),
            pending = self.pending.len(),
            "request settled"
        );
        Some(request)
    }

    /// Number of requests still in flight.
    pub fn pending_count(&self) -> u64 {
        u64::try_from(self.pending.len()).unwrap_or(u64::MAX)
    }

    /// The longest-outstanding request, if any.
    pub fn oldest_pending(&self) -> Option<&SyncRequest> {
        self.pending.values().next()
    }

    /// Requests dispatched over the ledger's lifetime.
    pub const fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Requests that settled with a payload.
    pub const fn resolved(&self) -> u64 {
        self.resolved
    }

    /// Requests that settled with an error.
    pub const fn failed(&self) -> u64 {
        self.failed
    }
}
