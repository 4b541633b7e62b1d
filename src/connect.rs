//! Session establishment: the MCP initialize handshake over a built
//! transport, with the transport-appropriate deadline.

use std::time::Duration;

use rmcp::{
    model::ClientInfo,
    service::{RoleClient, RunningService},
    transport::IntoTransport,
    ServiceExt,
};
use tracing::info;

use crate::{
    config::ClientIdentity,
    error::{McpError, McpResult},
    transport::TransportHandle,
};

/// An initialized MCP session.
pub type McpSession = RunningService<RoleClient, ClientInfo>;

/// Handshake deadline for stdio and streamable HTTP transports. SSE is
/// exempt: the server may hold the event stream open for as long as it
/// likes before the endpoint event arrives.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Run the initialize handshake over `handle`, presenting `identity` to
/// the server.
pub(crate) async fn establish(
    handle: TransportHandle,
    identity: &ClientIdentity,
) -> McpResult<McpSession> {
    let kind = handle.kind();
    let limit = handle.connect_timeout();
    let info = identity.to_client_info();

    let session = match handle {
        TransportHandle::Stdio(transport) => serve_with_timeout(info, transport, limit).await?,
        TransportHandle::Sse(transport) => serve_with_timeout(info, transport, limit).await?,
        TransportHandle::Streamable(transport) => {
            serve_with_timeout(info, transport, limit).await?
        }
    };

    info!(transport = kind, "MCP session established");
    Ok(session)
}

async fn serve_with_timeout<T, E, A>(
    info: ClientInfo,
    transport: T,
    limit: Option<Duration>,
) -> McpResult<McpSession>
where
    T: IntoTransport<RoleClient, E, A>,
    E: std::error::Error + Send + Sync + 'static,
{
    let handshake = info.serve(transport);
    let outcome = match limit {
        Some(limit) => tokio::time::timeout(limit, handshake)
            .await
            .map_err(|_| McpError::ConnectTimeout(limit))?,
        None => handshake.await,
    };
    outcome.map_err(|e| McpError::ConnectionFailed(format!("initialize session: {}", e)))
}
