//! Method dispatcher.
//!
//! Routes a decoded request by method name:
//! 1. Capability negotiation (`initialize`)
//! 2. Discovery (`rpc.discover`, `schema`, `tools/list`, unknown methods)
//! 3. Tool invocation, either direct (`method` is a tool name) or wrapped
//!    (`tools/call` and its aliases)
//! 4. Notifications and ping
//!
//! Every tool call leaves through [`canonicalize`].

use std::sync::Arc;

use serde_json::{json, Value};

use crate::invoker::{render_text, ToolOutcome, UpstreamInvoker};
use crate::protocol::{
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId, RequestRejection,
    ServerCapabilities, ServerInfo, ToolCallParams, ToolCallResult, MCP_VERSION,
};
use crate::registry::ToolRegistry;

/// Wrapped tool-call methods. The last two are kept for older clients.
pub const TOOL_CALL_METHODS: &[&str] = &["tools/call", "tools/invoke", "call_tool"];

/// Methods answered with the discovery document.
pub const DISCOVERY_METHODS: &[&str] = &["rpc.discover", "schema", "tools/list"];

/// How a method is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodKind<'a> {
    Initialize,
    Discovery,
    DirectTool(&'a str),
    WrappedTool,
    Notification,
    Ping,
    Unknown,
}

/// Stateless request router shared by the HTTP and stdio transports.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    invoker: Arc<UpstreamInvoker>,
    server_info: ServerInfo,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ToolRegistry>,
        invoker: Arc<UpstreamInvoker>,
        server_info: ServerInfo,
    ) -> Self {
        Self {
            registry,
            invoker,
            server_info,
        }
    }

    pub fn invoker(&self) -> &UpstreamInvoker {
        &self.invoker
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// The discovery document served by every discovery path.
    pub fn discovery(&self) -> Value {
        self.registry.discovery_document(&self.server_info)
    }

    pub fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities::default(),
            server_info: self.server_info.clone(),
        }
    }

    pub fn classify<'a>(&self, method: &'a str) -> MethodKind<'a> {
        match method {
            "initialize" => MethodKind::Initialize,
            "ping" => MethodKind::Ping,
            m if DISCOVERY_METHODS.contains(&m) => MethodKind::Discovery,
            m if TOOL_CALL_METHODS.contains(&m) => MethodKind::WrappedTool,
            m if m.starts_with("notifications/") => MethodKind::Notification,
            m if self.registry.contains(m) => MethodKind::DirectTool(m),
            _ => MethodKind::Unknown,
        }
    }

    /// Dispatch the outcome of decoding a body. Rejections become error
    /// envelopes carrying whatever id was recovered.
    pub async fn dispatch_decoded(
        &self,
        decoded: Result<JsonRpcRequest, RequestRejection>,
    ) -> JsonRpcResponse {
        match decoded {
            Ok(req) => self.dispatch(req).await,
            Err(rejection) => {
                tracing::debug!(code = rejection.error.code, "Rejected request");
                rejection.into_response()
            }
        }
    }

    /// Handle a JSON-RPC request.
    pub async fn dispatch(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!(method = req.method.as_str(), id = ?req.id, "Handling request");

        match self.classify(&req.method) {
            MethodKind::Initialize => self.handle_initialize(req.id),
            MethodKind::Discovery => JsonRpcResponse::success(req.id, self.discovery()),
            MethodKind::Notification | MethodKind::Ping => {
                JsonRpcResponse::success(req.id, json!({}))
            }
            MethodKind::DirectTool(name) => {
                let args = req.params.clone().unwrap_or_else(|| json!({}));
                self.call_tool(req.id, name, args).await
            }
            MethodKind::WrappedTool => self.handle_wrapped_call(req.id, req.params).await,
            MethodKind::Unknown => {
                tracing::debug!(
                    method = req.method.as_str(),
                    "Unknown method, answering with discovery"
                );
                JsonRpcResponse::success(req.id, self.discovery())
            }
        }
    }

    fn handle_initialize(&self, id: RequestId) -> JsonRpcResponse {
        match serde_json::to_value(self.initialize_result()) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(&e.to_string())),
        }
    }

    async fn handle_wrapped_call(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params = params.unwrap_or_else(|| json!({}));
        if params.get("name").map_or(true, Value::is_null) {
            return JsonRpcResponse::error(id, JsonRpcError::invalid_params("missing tool name"));
        }

        let call: ToolCallParams = match serde_json::from_value(params) {
            Ok(call) => call,
            Err(e) => {
                tracing::debug!(error = %e, "Malformed tool call params");
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params("tool name must be a string"),
                );
            }
        };

        let args = call
            .arguments
            .filter(|a| !a.is_null())
            .unwrap_or_else(|| json!({}));

        self.call_tool(id, &call.name, args).await
    }

    /// Validate, invoke and canonicalize one tool call.
    async fn call_tool(&self, id: RequestId, name: &str, args: Value) -> JsonRpcResponse {
        if let Err(error) = self.registry.validate(name, &args) {
            tracing::debug!(tool = name, code = error.code, "Tool call rejected");
            return JsonRpcResponse::error(id, error);
        }

        let outcome = self.invoker.invoke(name, &args).await;
        JsonRpcResponse::success(id, canonicalize(outcome))
    }
}

/// Build the wire payload of a tool call: exactly one text content item.
pub fn canonicalize(outcome: ToolOutcome) -> Value {
    let result = match outcome {
        ToolOutcome::Success(value) => ToolCallResult::text(render_text(&value)),
        ToolOutcome::Failure(message) => ToolCallResult::error(message),
    };

    serde_json::to_value(&result).unwrap_or_else(|e| {
        json!({
            "content": [{"type": "text", "text": e.to_string()}],
            "isError": true
        })
    })
}
