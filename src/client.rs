//! The client facade: one connected MCP server behind a uniform,
//! instrumented call surface.
//!
//! Every operation goes through a single instrumentation point that
//! submits exactly one metrics observation per call (success or failure,
//! with wall-clock duration) and honors the facade's cancellation token.

use std::{borrow::Cow, num::NonZeroUsize, sync::Arc, time::Duration};

use rmcp::model::{
    CallToolRequestParam, CallToolResult, GetPromptRequestParam, GetPromptResult,
    ListPromptsResult, ListResourcesResult, ListToolsResult, Prompt, ReadResourceRequestParam,
    ReadResourceResult, Resource, Tool,
};
use serde_json::Map;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    config::{ClientIdentity, HttpEnv, ServerTransport},
    connect, transport,
    error::{McpError, McpResult},
    metrics::{CallMetrics, MetricsSink},
    paginate::{self, Page},
    session::ProtocolSession,
};

/// Liveness checks get a short deadline of their own, independent of any
/// caller-side timeout.
const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Operation names as submitted to the metrics sink.
mod op {
    pub const PING: &str = "ping";
    pub const LIST_TOOLS: &str = "list_tools";
    pub const CALL_TOOL: &str = "call_tool";
    pub const LIST_PROMPTS: &str = "list_prompts";
    pub const GET_PROMPT: &str = "get_prompt";
    pub const LIST_RESOURCES: &str = "list_resources";
    pub const READ_RESOURCE: &str = "read_resource";
    pub const LIST_ALL_TOOLS: &str = "list_all_tools";
    pub const LIST_ALL_PROMPTS: &str = "list_all_prompts";
    pub const LIST_ALL_RESOURCES: &str = "list_all_resources";
}

/// A facade over one connected MCP server.
pub struct Client {
    session: Box<dyn ProtocolSession>,
    cancel: CancellationToken,
    metrics: Arc<dyn MetricsSink>,
    page_limit: Option<NonZeroUsize>,
}

impl Client {
    /// Start building a client for the given transport.
    pub fn builder(transport: ServerTransport) -> ClientBuilder {
        ClientBuilder {
            transport,
            env: HttpEnv::default(),
            identity: ClientIdentity::default(),
            cancel: CancellationToken::new(),
            metrics: None,
            page_limit: None,
        }
    }

    fn from_parts(
        session: Box<dyn ProtocolSession>,
        cancel: CancellationToken,
        metrics: Arc<dyn MetricsSink>,
        page_limit: Option<NonZeroUsize>,
    ) -> Self {
        Self {
            session,
            cancel,
            metrics,
            page_limit,
        }
    }

    /// The metrics sink this client reports into.
    pub fn metrics(&self) -> Arc<dyn MetricsSink> {
        Arc::clone(&self.metrics)
    }

    /// Liveness check. Collapses every failure, including the deadline,
    /// to `false`; the cause is logged at debug level.
    pub async fn ping(&self) -> bool {
        self.observed(op::PING, async {
            match tokio::time::timeout(PING_TIMEOUT, self.session.ping()).await {
                Ok(result) => result,
                Err(_) => Err(McpError::Transport(format!(
                    "ping exceeded {:?} deadline",
                    PING_TIMEOUT
                ))),
            }
        })
        .await
        .is_ok()
    }

    /// Fetch one page of tools.
    pub async fn list_tools(&self, cursor: Option<String>) -> McpResult<ListToolsResult> {
        self.observed(op::LIST_TOOLS, self.session.list_tools(cursor))
            .await
    }

    /// Fetch one page of prompts.
    pub async fn list_prompts(&self, cursor: Option<String>) -> McpResult<ListPromptsResult> {
        self.observed(op::LIST_PROMPTS, self.session.list_prompts(cursor))
            .await
    }

    /// Fetch one page of resources.
    pub async fn list_resources(&self, cursor: Option<String>) -> McpResult<ListResourcesResult> {
        self.observed(op::LIST_RESOURCES, self.session.list_resources(cursor))
            .await
    }

    /// Invoke a tool by name.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, serde_json::Value>>,
    ) -> McpResult<CallToolResult> {
        let request = CallToolRequestParam {
            name: Cow::Owned(name.to_string()),
            arguments,
        };
        self.observed(op::CALL_TOOL, self.session.call_tool(request))
            .await
    }

    /// Fetch a prompt by name.
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<Map<String, serde_json::Value>>,
    ) -> McpResult<GetPromptResult> {
        let request = GetPromptRequestParam {
            name: name.to_string(),
            arguments,
        };
        self.observed(op::GET_PROMPT, self.session.get_prompt(request))
            .await
    }

    /// Read a resource by URI.
    pub async fn read_resource(&self, uri: &str) -> McpResult<ReadResourceResult> {
        let request = ReadResourceRequestParam {
            uri: uri.to_string(),
        };
        self.observed(op::READ_RESOURCE, self.session.read_resource(request))
            .await
    }

    /// Fetch every tool the server exposes, following pagination cursors.
    pub async fn list_all_tools(&self) -> McpResult<Vec<Tool>> {
        let session = self.session.as_ref();
        self.observed(
            op::LIST_ALL_TOOLS,
            paginate::collect_pages(op::LIST_ALL_TOOLS, self.page_limit, move |cursor| async move {
                let result = session.list_tools(cursor).await?;
                Ok(Page::full(result.tools, result.next_cursor))
            }),
        )
        .await
    }

    /// Fetch every prompt the server exposes, following pagination cursors.
    pub async fn list_all_prompts(&self) -> McpResult<Vec<Prompt>> {
        let session = self.session.as_ref();
        self.observed(
            op::LIST_ALL_PROMPTS,
            paginate::collect_pages(
                op::LIST_ALL_PROMPTS,
                self.page_limit,
                move |cursor| async move {
                    let result = session.list_prompts(cursor).await?;
                    Ok(Page::full(result.prompts, result.next_cursor))
                },
            ),
        )
        .await
    }

    /// Fetch every resource the server exposes, following pagination
    /// cursors.
    pub async fn list_all_resources(&self) -> McpResult<Vec<Resource>> {
        let session = self.session.as_ref();
        self.observed(
            op::LIST_ALL_RESOURCES,
            paginate::collect_pages(
                op::LIST_ALL_RESOURCES,
                self.page_limit,
                move |cursor| async move {
                    let result = session.list_resources(cursor).await?;
                    Ok(Page::full(result.resources, result.next_cursor))
                },
            ),
        )
        .await
    }

    /// Shut the session down, releasing its transport.
    pub async fn close(self) -> McpResult<()> {
        self.session.close().await
    }

    /// Run one operation under the cancellation token and submit exactly
    /// one metrics observation for it.
    async fn observed<T>(
        &self,
        op: &'static str,
        fut: impl std::future::Future<Output = McpResult<T>>,
    ) -> McpResult<T> {
        let started = Instant::now();
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(McpError::Cancelled),
            result = fut => result,
        };
        self.metrics.observe(op, started.elapsed(), result.is_ok());
        if let Err(e) = &result {
            debug!(op, error = %e, "operation failed");
        }
        result
    }
}

/// Configures and connects a [`Client`].
pub struct ClientBuilder {
    transport: ServerTransport,
    env: HttpEnv,
    identity: ClientIdentity,
    cancel: CancellationToken,
    metrics: Option<Arc<dyn MetricsSink>>,
    page_limit: Option<NonZeroUsize>,
}

impl ClientBuilder {
    /// HTTP environment (TLS, resolver, connection reuse) for SSE and
    /// streamable HTTP transports. Ignored by stdio.
    pub fn http_env(mut self, env: HttpEnv) -> Self {
        self.env = env;
        self
    }

    /// Name and version announced during the handshake.
    pub fn identity(mut self, identity: ClientIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Token that aborts in-flight operations with
    /// [`McpError::Cancelled`]. Connected clients observe it immediately.
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Sink for per-operation observations. Defaults to a private
    /// [`CallMetrics`].
    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Cap the number of pages one `list_all_*` call may fetch. Without a
    /// cap a server that always returns a cursor loops until cancelled.
    pub fn page_limit(mut self, limit: NonZeroUsize) -> Self {
        self.page_limit = Some(limit);
        self
    }

    /// Build the transport, run the handshake, and return the connected
    /// client. Stdio and streamable HTTP handshakes are bounded by a 30s
    /// deadline; SSE waits for the server.
    pub async fn connect(self) -> McpResult<Client> {
        self.transport.validate()?;
        let handle = transport::build(&self.transport, &self.env).await?;
        let session = connect::establish(handle, &self.identity).await?;

        let metrics = self
            .metrics
            .unwrap_or_else(|| Arc::new(CallMetrics::new()));
        Ok(Client::from_parts(
            Box::new(session),
            self.cancel,
            metrics,
            self.page_limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    use async_trait::async_trait;

    use super::*;

    fn test_tool(name: &str) -> Tool {
        Tool {
            name: Cow::Owned(name.to_string()),
            title: None,
            description: None,
            input_schema: Arc::new(Map::new()),
            output_schema: None,
            annotations: None,
            icons: None,
        }
    }

    fn tool_page(names: &[&str], next_cursor: Option<&str>) -> ListToolsResult {
        ListToolsResult {
            tools: names.iter().map(|n| test_tool(n)).collect(),
            next_cursor: next_cursor.map(str::to_string),
        }
    }

    /// Scripted session: pops one pre-seeded result per `list_tools`
    /// call and records the cursor it was asked for. An exhausted script
    /// hangs forever, which the cancellation tests rely on.
    #[derive(Default)]
    struct FakeSession {
        tool_pages: Mutex<VecDeque<McpResult<ListToolsResult>>>,
        seen_cursors: Mutex<Vec<Option<String>>>,
        fail_ping: bool,
        fail_calls: bool,
    }

    impl FakeSession {
        fn with_tool_pages(pages: Vec<McpResult<ListToolsResult>>) -> Self {
            Self {
                tool_pages: Mutex::new(pages.into()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ProtocolSession for FakeSession {
        async fn ping(&self) -> McpResult<()> {
            if self.fail_ping {
                Err(McpError::Transport("connection reset".to_string()))
            } else {
                Ok(())
            }
        }

        async fn list_tools(&self, cursor: Option<String>) -> McpResult<ListToolsResult> {
            self.seen_cursors.lock().unwrap().push(cursor);
            let next = self.tool_pages.lock().unwrap().pop_front();
            match next {
                Some(result) => result,
                None => std::future::pending().await,
            }
        }

        async fn list_prompts(&self, _cursor: Option<String>) -> McpResult<ListPromptsResult> {
            Ok(ListPromptsResult {
                prompts: vec![],
                next_cursor: None,
            })
        }

        async fn list_resources(&self, _cursor: Option<String>) -> McpResult<ListResourcesResult> {
            Ok(ListResourcesResult {
                resources: vec![],
                next_cursor: None,
            })
        }

        async fn call_tool(&self, _params: CallToolRequestParam) -> McpResult<CallToolResult> {
            if self.fail_calls {
                Err(McpError::Transport("stream closed".to_string()))
            } else {
                Ok(CallToolResult::success(vec![]))
            }
        }

        async fn get_prompt(&self, _params: GetPromptRequestParam) -> McpResult<GetPromptResult> {
            Err(McpError::Transport("not scripted".to_string()))
        }

        async fn read_resource(
            &self,
            _params: ReadResourceRequestParam,
        ) -> McpResult<ReadResourceResult> {
            Err(McpError::Transport("not scripted".to_string()))
        }

        async fn close(self: Box<Self>) -> McpResult<()> {
            Ok(())
        }
    }

    /// Records every observation so tests can assert the one-per-call
    /// invariant.
    #[derive(Default)]
    struct RecordingSink {
        observations: Mutex<Vec<(&'static str, bool)>>,
    }

    impl MetricsSink for RecordingSink {
        fn observe(&self, op: &'static str, _elapsed: Duration, success: bool) {
            self.observations.lock().unwrap().push((op, success));
        }
    }

    fn test_client(session: FakeSession, sink: Arc<RecordingSink>) -> Client {
        Client::from_parts(
            Box::new(session),
            CancellationToken::new(),
            sink,
            None,
        )
    }

    #[tokio::test]
    async fn list_all_tools_concatenates_pages_in_order() {
        let session = FakeSession::with_tool_pages(vec![
            Ok(tool_page(&["a", "b"], Some("c1"))),
            Ok(tool_page(&["c"], Some("c2"))),
            Ok(tool_page(&["d"], None)),
        ]);
        let sink = Arc::new(RecordingSink::default());
        let client = test_client(session, Arc::clone(&sink));

        let tools = client.list_all_tools().await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);

        assert_eq!(
            *sink.observations.lock().unwrap(),
            vec![("list_all_tools", true)]
        );
    }

    #[tokio::test]
    async fn list_all_tools_failure_discards_and_observes_once() {
        let session = FakeSession::with_tool_pages(vec![
            Ok(tool_page(&["a"], Some("c1"))),
            Err(McpError::Transport("stream reset".to_string())),
        ]);
        let sink = Arc::new(RecordingSink::default());
        let client = test_client(session, Arc::clone(&sink));

        let result = client.list_all_tools().await;
        assert!(matches!(result, Err(McpError::Aggregation { page: 2, .. })));

        assert_eq!(
            *sink.observations.lock().unwrap(),
            vec![("list_all_tools", false)]
        );
    }

    #[tokio::test]
    async fn page_limit_stops_a_cursor_loop() {
        let session = FakeSession::with_tool_pages(vec![
            Ok(tool_page(&["a"], Some("c1"))),
            Ok(tool_page(&["b"], Some("c2"))),
        ]);
        let sink = Arc::new(RecordingSink::default());
        let client = Client::from_parts(
            Box::new(session),
            CancellationToken::new(),
            sink,
            NonZeroUsize::new(2),
        );

        let result = client.list_all_tools().await;
        match result {
            Err(McpError::Aggregation { source, .. }) => {
                assert!(matches!(
                    *source,
                    McpError::PageLimitExceeded { limit: 2, .. }
                ));
            }
            other => panic!("expected aggregation error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn single_page_ops_observe_success_and_failure() {
        let ok_session = FakeSession::with_tool_pages(vec![Ok(tool_page(&["a"], None))]);
        let sink = Arc::new(RecordingSink::default());
        let client = test_client(ok_session, Arc::clone(&sink));

        assert!(client.list_tools(None).await.is_ok());
        assert!(client.call_tool("echo", None).await.is_ok());

        let failing = FakeSession {
            fail_calls: true,
            ..FakeSession::default()
        };
        let failing_client = test_client(failing, Arc::clone(&sink));
        assert!(failing_client.call_tool("echo", None).await.is_err());

        assert_eq!(
            *sink.observations.lock().unwrap(),
            vec![
                ("list_tools", true),
                ("call_tool", true),
                ("call_tool", false)
            ]
        );
    }

    #[tokio::test]
    async fn ping_collapses_failure_to_false() {
        let sink = Arc::new(RecordingSink::default());

        let healthy = test_client(FakeSession::default(), Arc::clone(&sink));
        assert!(healthy.ping().await);

        let severed = test_client(
            FakeSession {
                fail_ping: true,
                ..FakeSession::default()
            },
            Arc::clone(&sink),
        );
        assert!(!severed.ping().await);

        assert_eq!(
            *sink.observations.lock().unwrap(),
            vec![("ping", true), ("ping", false)]
        );
    }

    #[tokio::test]
    async fn cancelled_token_rejects_before_any_fetch() {
        let session = FakeSession::with_tool_pages(vec![Ok(tool_page(&["a"], None))]);
        let sink = Arc::new(RecordingSink::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let client = Client::from_parts(
            Box::new(session),
            cancel,
            Arc::clone(&sink) as Arc<dyn MetricsSink>,
            None,
        );

        let result = client.list_all_tools().await;
        assert!(matches!(result, Err(McpError::Cancelled)));

        // One observation, zero remote calls.
        assert_eq!(
            *sink.observations.lock().unwrap(),
            vec![("list_all_tools", false)]
        );
    }

    #[tokio::test]
    async fn cancellation_aborts_a_mid_flight_aggregation() {
        // One real page, then the session hangs; cancellation must win.
        let session = FakeSession::with_tool_pages(vec![Ok(tool_page(&["a"], Some("c1")))]);
        let sink = Arc::new(RecordingSink::default());
        let cancel = CancellationToken::new();
        let client = Client::from_parts(
            Box::new(session),
            cancel.clone(),
            Arc::clone(&sink) as Arc<dyn MetricsSink>,
            None,
        );

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        let result = client.list_all_tools().await;
        assert!(matches!(result, Err(McpError::Cancelled)));
        canceller.await.unwrap();

        assert_eq!(
            *sink.observations.lock().unwrap(),
            vec![("list_all_tools", false)]
        );
    }

    #[tokio::test]
    async fn every_operation_reports_exactly_one_observation() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        struct CountingSink;
        impl MetricsSink for CountingSink {
            fn observe(&self, _op: &'static str, _elapsed: Duration, _success: bool) {
                CALLS.fetch_add(1, Ordering::Relaxed);
            }
        }

        let client = Client::from_parts(
            Box::new(FakeSession::default()),
            CancellationToken::new(),
            Arc::new(CountingSink),
            None,
        );

        client.ping().await;
        client.list_prompts(None).await.unwrap();
        assert_eq!(CALLS.load(Ordering::Relaxed), 2);
    }
}
