//! HTTP client construction for the streaming transports.
//!
//! Applies the host environment (TLS, connection reuse, resolver) and the
//! bearer credential to a single reqwest client that the transport then
//! owns for its lifetime.

use std::{sync::Arc, time::Duration};

use reqwest::{
    dns::{Name, Resolve, Resolving},
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
};

use crate::{
    config::{AuthConfig, HttpEnv},
    error::{McpError, McpResult},
};

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Adapter so a shared trait object can be handed to reqwest's sized
/// resolver slot.
struct SharedResolver(Arc<dyn Resolve>);

impl Resolve for SharedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        self.0.resolve(name)
    }
}

/// Build the HTTP client for an SSE or streamable transport.
///
/// Proxy settings are picked up from the process environment (reqwest's
/// default). When a bearer token is configured, every outgoing request
/// carries `Authorization: Bearer <token>`; decoration happens at the
/// builder level so no other setting is lost.
pub(crate) fn build_http_client(env: &HttpEnv, auth: &AuthConfig) -> McpResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .http1_only()
        .connect_timeout(HTTP_CONNECT_TIMEOUT);

    if let Some(tls) = &env.tls {
        let mut tls = tls.clone();
        // Streaming endpoints negotiate HTTP/1.1 only.
        tls.alpn_protocols = vec![b"http/1.1".to_vec()];
        builder = builder.use_preconfigured_tls(tls);
    }

    if env.no_connection_reuse {
        builder = builder.pool_max_idle_per_host(0);
    }

    if let Some(resolver) = &env.dns_resolver {
        builder = builder.dns_resolver(Arc::new(SharedResolver(Arc::clone(resolver))));
    }

    if let Some(headers) = bearer_headers(auth)? {
        builder = builder.default_headers(headers);
    }

    builder
        .build()
        .map_err(|e| McpError::Transport(format!("build HTTP client: {}", e)))
}

/// The `Authorization` header for a configured bearer token, or `None`
/// when no (or an empty) token is set.
pub(crate) fn bearer_headers(auth: &AuthConfig) -> McpResult<Option<HeaderMap>> {
    let Some(token) = auth.token() else {
        return Ok(None);
    };

    let mut value: HeaderValue = format!("Bearer {}", token)
        .parse()
        .map_err(|e| McpError::Config(format!("invalid bearer token: {}", e)))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(Some(headers))
}
