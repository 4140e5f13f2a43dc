//! Error types for configuration and the collection cycle.

use thiserror::Error;

/// Startup failures. The process does not enter its loop when one occurs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in .env or environment")]
    Missing(&'static str),

    #[error("Invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Why a single collection cycle produced no rows.
///
/// None of these stop the collector; the loop logs them and waits for the
/// next scheduled slot.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Connection fault, timeout, or non-success HTTP status.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered but the payload is not usable (quota, bad key, shape).
    #[error("upstream data error: {0}")]
    UpstreamData(String),

    /// Write or commit failed; nothing from this cycle was persisted.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl CollectError {
    /// Short label for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            CollectError::Transport(_) => "transport",
            CollectError::UpstreamData(_) => "upstream_data",
            CollectError::Storage(_) => "storage",
        }
    }
}
