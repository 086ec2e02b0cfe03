//! Error types for the sync engine.
//!
//! [`EngineError`] covers setup only. Once the loop is running, every
//! failure is non-fatal and ends up in the display's `last_error`.

use lifesync_core::config::ConfigError;
use lifesync_core::request::SyncError;

/// Errors that can occur while building the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The transport could not be constructed.
    #[error("transport error: {source}")]
    Transport {
        /// The underlying client error.
        #[from]
        source: SyncError,
    },
}
