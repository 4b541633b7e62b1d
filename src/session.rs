//! The protocol seam between the facade and a live rmcp session.
//!
//! [`ProtocolSession`] is the narrow surface the facade actually needs.
//! Production code gets the rmcp-backed implementation; tests substitute
//! scripted sessions without any transport.

use async_trait::async_trait;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ClientRequest, GetPromptRequestParam, GetPromptResult,
    ListPromptsResult, ListResourcesResult, ListToolsResult, PaginatedRequestParam, PingRequest,
    ReadResourceRequestParam, ReadResourceResult,
};

use crate::{
    connect::McpSession,
    error::{McpError, McpResult},
};

/// One initialized MCP session, expressed as the operations the facade
/// performs against it.
#[async_trait]
pub trait ProtocolSession: Send + Sync {
    async fn ping(&self) -> McpResult<()>;

    async fn list_tools(&self, cursor: Option<String>) -> McpResult<ListToolsResult>;
    async fn list_prompts(&self, cursor: Option<String>) -> McpResult<ListPromptsResult>;
    async fn list_resources(&self, cursor: Option<String>) -> McpResult<ListResourcesResult>;

    async fn call_tool(&self, params: CallToolRequestParam) -> McpResult<CallToolResult>;
    async fn get_prompt(&self, params: GetPromptRequestParam) -> McpResult<GetPromptResult>;
    async fn read_resource(&self, params: ReadResourceRequestParam)
        -> McpResult<ReadResourceResult>;

    /// Shut the session down, releasing its transport.
    async fn close(self: Box<Self>) -> McpResult<()>;
}

fn page_param(cursor: Option<String>) -> Option<PaginatedRequestParam> {
    cursor.map(|cursor| PaginatedRequestParam {
        cursor: Some(cursor),
    })
}

#[async_trait]
impl ProtocolSession for McpSession {
    async fn ping(&self) -> McpResult<()> {
        // The peer exposes no typed ping method; send the request directly.
        self.peer()
            .send_request(ClientRequest::PingRequest(PingRequest::default()))
            .await
            .map(|_| ())
            .map_err(McpError::from)
    }

    async fn list_tools(&self, cursor: Option<String>) -> McpResult<ListToolsResult> {
        self.peer()
            .list_tools(page_param(cursor))
            .await
            .map_err(McpError::from)
    }

    async fn list_prompts(&self, cursor: Option<String>) -> McpResult<ListPromptsResult> {
        self.peer()
            .list_prompts(page_param(cursor))
            .await
            .map_err(McpError::from)
    }

    async fn list_resources(&self, cursor: Option<String>) -> McpResult<ListResourcesResult> {
        self.peer()
            .list_resources(page_param(cursor))
            .await
            .map_err(McpError::from)
    }

    async fn call_tool(&self, params: CallToolRequestParam) -> McpResult<CallToolResult> {
        self.peer().call_tool(params).await.map_err(McpError::from)
    }

    async fn get_prompt(&self, params: GetPromptRequestParam) -> McpResult<GetPromptResult> {
        self.peer().get_prompt(params).await.map_err(McpError::from)
    }

    async fn read_resource(
        &self,
        params: ReadResourceRequestParam,
    ) -> McpResult<ReadResourceResult> {
        self.peer()
            .read_resource(params)
            .await
            .map_err(McpError::from)
    }

    async fn close(self: Box<Self>) -> McpResult<()> {
        (*self)
            .cancel()
            .await
            .map_err(|e| McpError::Transport(format!("shut down session: {}", e)))?;
        Ok(())
    }
}
