//! Error types for the probe client.
//!
//! Defines error variants for configuration, connection establishment,
//! remote calls, and page aggregation.

use std::time::Duration;

use rmcp::service::ServiceError;
use thiserror::Error;

pub type McpResult<T> = Result<T, McpError>;

#[derive(Debug, Error)]
pub enum McpError {
    /// Malformed or incomplete construction input. Fatal to that
    /// construction attempt.
    #[error("configuration error: {0}")]
    Config(String),

    /// The connect handshake did not finish within the fixed deadline.
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// The connect handshake failed (process failed to start, endpoint
    /// unreachable, protocol negotiation rejected). Never retried.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// A single remote call failed. The session stays usable.
    #[error("remote call failed: {0}")]
    Call(#[from] ServiceError),

    /// The facade's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    /// A page fetch inside a list-all loop failed. Items accumulated
    /// before the failure are discarded.
    #[error("{op} failed on page {page}: {source}")]
    Aggregation {
        op: &'static str,
        page: usize,
        #[source]
        source: Box<McpError>,
    },

    /// The server kept returning cursors past the configured page cap.
    /// Carried as the source of an [`Aggregation`](Self::Aggregation) error.
    #[error("{op} exceeded the configured limit of {limit} pages")]
    PageLimitExceeded { op: &'static str, limit: usize },
}
