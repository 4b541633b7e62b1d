//! Model Context Protocol (MCP) client facade.
//!
//! Connects to one MCP server over stdio, SSE, or streamable HTTP and
//! exposes its operations behind a uniform, instrumented call surface.
//!
//! ## Modules
//!
//! - [`client`]: the facade and its builder
//! - [`config`]: transport descriptions, auth, identity, HTTP environment
//! - [`connect`]: handshake and session establishment
//! - [`session`]: the protocol seam between facade and live session
//! - [`metrics`]: per-operation observations
//! - [`error`]: the crate's error type

pub mod client;
pub mod config;
pub mod connect;
pub mod error;
pub mod metrics;
pub mod session;

mod http;
mod paginate;
mod transport;

pub use client::{Client, ClientBuilder};
pub use config::{AuthConfig, ClientIdentity, HttpEnv, ServerTransport};
pub use connect::McpSession;
pub use error::{McpError, McpResult};
pub use metrics::{CallMetrics, LatencySnapshot, MetricsSink, MetricsSnapshot};
pub use session::ProtocolSession;

// Protocol types callers exchange with the facade.
pub use rmcp::model::{
    CallToolRequestParam, CallToolResult, GetPromptRequestParam, GetPromptResult,
    ListPromptsResult, ListResourcesResult, ListToolsResult, Prompt, ReadResourceRequestParam,
    ReadResourceResult, Resource, Tool,
};
