//! Client configuration types.
//!
//! Defines the transport selector, bearer auth, the host-supplied HTTP
//! environment, and the handshake identity.

use std::{collections::HashMap, fmt, sync::Arc};

use reqwest::dns::Resolve;
use rmcp::model::ClientInfo;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{McpError, McpResult};

/// Bearer-token credentials for the streaming HTTP transports.
///
/// An absent or empty token means the client sends no `Authorization`
/// header at all.
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
}

impl AuthConfig {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
        }
    }

    /// The effective token, treating the empty string as unset.
    pub(crate) fn token(&self) -> Option<&str> {
        self.bearer_token.as_deref().filter(|t| !t.is_empty())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("bearer_token", &self.token().map(|_| "****"))
            .finish()
    }
}

/// Which transport a client connects over, with the fields that transport
/// needs. Exactly one variant exists per client; there are no unused
/// cross-transport fields.
#[derive(Clone, Deserialize, Serialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum ServerTransport {
    /// Local subprocess speaking MCP over its stdio pipes.
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        /// Additional environment entries, layered over the inherited
        /// parent environment.
        #[serde(default)]
        envs: HashMap<String, String>,
        /// Inherit the child's stderr into this process's stderr.
        #[serde(default)]
        debug: bool,
    },
    /// One-way streaming HTTP (server-sent events).
    Sse {
        url: String,
        #[serde(default)]
        auth: AuthConfig,
    },
    /// Bidirectional streaming HTTP.
    Streamable {
        url: String,
        #[serde(default)]
        auth: AuthConfig,
    },
}

impl ServerTransport {
    pub fn stdio(command: impl Into<String>) -> Self {
        Self::Stdio {
            command: command.into(),
            args: Vec::new(),
            envs: HashMap::new(),
            debug: false,
        }
    }

    pub fn sse(url: impl Into<String>, auth: AuthConfig) -> Self {
        Self::Sse {
            url: url.into(),
            auth,
        }
    }

    pub fn streamable(url: impl Into<String>, auth: AuthConfig) -> Self {
        Self::Streamable {
            url: url.into(),
            auth,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Stdio { .. } => "stdio",
            Self::Sse { .. } => "sse",
            Self::Streamable { .. } => "streamable",
        }
    }

    pub(crate) fn validate(&self) -> McpResult<()> {
        match self {
            Self::Stdio { command, .. } => {
                if command.is_empty() {
                    return Err(McpError::Config("stdio command is empty".to_string()));
                }
            }
            Self::Sse { url, .. } | Self::Streamable { url, .. } => {
                let parsed = Url::parse(url)
                    .map_err(|e| McpError::Config(format!("invalid endpoint '{}': {}", url, e)))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(McpError::Config(format!(
                        "unsupported endpoint scheme '{}'",
                        parsed.scheme()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ServerTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio {
                command,
                args,
                envs,
                debug,
            } => f
                .debug_struct("Stdio")
                .field("command", command)
                .field("args", args)
                .field("envs", envs)
                .field("debug", debug)
                .finish(),
            Self::Sse { url, auth } => f
                .debug_struct("Sse")
                .field("url", url)
                .field("auth", auth)
                .finish(),
            Self::Streamable { url, auth } => f
                .debug_struct("Streamable")
                .field("url", url)
                .field("auth", auth)
                .finish(),
        }
    }
}

/// Run-wide HTTP settings inherited from the embedding host and cloned
/// into each streaming client. Proxy settings come from the process
/// environment via reqwest's default behavior.
#[derive(Clone, Default)]
pub struct HttpEnv {
    /// TLS configuration shared by the host. Cloned per client; ALPN is
    /// pinned to HTTP/1.1 to satisfy streaming semantics.
    pub tls: Option<rustls::ClientConfig>,

    /// Disable connection reuse across requests.
    pub no_connection_reuse: bool,

    /// Host-supplied address resolution override.
    pub dns_resolver: Option<Arc<dyn Resolve>>,
}

impl fmt::Debug for HttpEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpEnv")
            .field("tls", &self.tls.as_ref().map(|_| "ClientConfig"))
            .field("no_connection_reuse", &self.no_connection_reuse)
            .field("dns_resolver", &self.dns_resolver.as_ref().map(|_| "dyn Resolve"))
            .finish()
    }
}

/// Name/version pair announced to the server during the handshake.
///
/// Injectable so the embedding layer can present its own identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientIdentity {
    pub name: String,
    pub version: String,
}

impl ClientIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub(crate) fn to_client_info(&self) -> ClientInfo {
        let mut info = ClientInfo::default();
        info.client_info.name = self.name.clone();
        info.client_info.version = self.version.clone();
        info
    }
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
