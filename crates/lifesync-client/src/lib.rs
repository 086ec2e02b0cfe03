//! HTTP sync client for the lifesync Game of Life viewer.
//!
//! Every remote operation is dispatched as a single-shot future tagged with
//! a sequence number taken at dispatch time. The caller decides where the
//! future runs; the engine spawns each one onto the tokio runtime.
//!
//! # Modules
//!
//! - [`client`] -- [`SyncClient`], endpoint paths, and dispatch.
//! - [`http`] -- [`HttpTransport`] over `reqwest`.
//! - [`transport`] -- The [`Transport`] trait tests substitute.
//!
//! [`SyncClient`]: client::SyncClient
//! [`HttpTransport`]: http::HttpTransport
//! [`Transport`]: transport::Transport

pub mod client;
pub mod http;
pub mod transport;

pub use client::{CompletionFuture, Dispatched, Endpoints, SyncClient};
pub use http::HttpTransport;
pub use transport::Transport;
