//! The seam between the sync client and the network.
//!
//! [`Transport`] is deliberately small: one GET and one POST, both
//! returning the decoded JSON body. The HTTP implementation lives in
//! [`crate::http`]; tests substitute their own.

use std::future::Future;

use lifesync_core::request::SyncError;

/// A single-shot request/response channel to the simulation server.
///
/// Implementations must never panic into the caller: every failure,
/// including a non-success status, comes back as a [`SyncError`]. A
/// response with an empty body decodes as an empty JSON object.
pub trait Transport: Send + Sync + 'static {
    /// Issue a GET to `path` (relative to the server's base URL).
    fn get(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<serde_json::Value, SyncError>> + Send;

    /// Issue a POST of `body` as JSON to `path`.
    fn post(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> impl Future<Output = Result<serde_json::Value, SyncError>> + Send;
}
