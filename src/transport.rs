//! Transport construction.
//!
//! Turns a [`ServerTransport`](crate::config::ServerTransport) description
//! into a live rmcp transport: a spawned child process for stdio, or an
//! HTTP-backed stream for SSE / streamable HTTP.

use std::{process::Stdio, time::Duration};

use rmcp::transport::{
    sse_client::SseClientConfig, streamable_http_client::StreamableHttpClientTransportConfig,
    ConfigureCommandExt, SseClientTransport, StreamableHttpClientTransport, TokioChildProcess,
};

use crate::{
    config::{HttpEnv, ServerTransport},
    connect::CONNECT_TIMEOUT,
    error::{McpError, McpResult},
    http::build_http_client,
};

/// A constructed-but-not-yet-initialized transport, ready for the MCP
/// handshake.
pub(crate) enum TransportHandle {
    Stdio(TokioChildProcess),
    Sse(SseClientTransport<reqwest::Client>),
    Streamable(StreamableHttpClientTransport<reqwest::Client>),
}

impl TransportHandle {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Stdio(_) => "stdio",
            Self::Sse(_) => "sse",
            Self::Streamable(_) => "streamable",
        }
    }

    /// How long the handshake may take. SSE servers are allowed to hold
    /// the stream open indefinitely, so no deadline applies there.
    pub(crate) fn connect_timeout(&self) -> Option<Duration> {
        match self {
            Self::Sse(_) => None,
            Self::Stdio(_) | Self::Streamable(_) => Some(CONNECT_TIMEOUT),
        }
    }
}

pub(crate) async fn build(
    transport: &ServerTransport,
    env: &HttpEnv,
) -> McpResult<TransportHandle> {
    match transport {
        ServerTransport::Stdio {
            command,
            args,
            envs,
            debug,
        } => {
            let process = TokioChildProcess::new(
                tokio::process::Command::new(command).configure(|cmd| {
                    cmd.args(args).envs(envs.iter());
                    cmd.stderr(if *debug { Stdio::inherit() } else { Stdio::null() });
                }),
            )
            .map_err(|e| McpError::ConnectionFailed(format!("spawn '{}': {}", command, e)))?;
            Ok(TransportHandle::Stdio(process))
        }
        ServerTransport::Sse { url, auth } => {
            let client = build_http_client(env, auth)?;
            let transport = SseClientTransport::start_with_client(
                client,
                SseClientConfig {
                    sse_endpoint: url.clone().into(),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| McpError::ConnectionFailed(format!("start SSE stream: {}", e)))?;
            Ok(TransportHandle::Sse(transport))
        }
        ServerTransport::Streamable { url, auth } => {
            let client = build_http_client(env, auth)?;
            let transport = StreamableHttpClientTransport::with_client(
                client,
                StreamableHttpClientTransportConfig::with_uri(url.as_str()),
            );
            Ok(TransportHandle::Streamable(transport))
        }
    }
}
