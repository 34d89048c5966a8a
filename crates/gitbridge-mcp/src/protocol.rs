//! MCP protocol types based on JSON-RPC 2.0.
//!
//! Builds and parses JSON-RPC envelopes and normalizes the legacy
//! `{action_id, parameters}` body into a regular request. Everything here is
//! a pure transform.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON-RPC version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version.
pub const MCP_VERSION: &str = "2024-11-05";

/// JSON-RPC request message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }

    /// Fetch a top-level field of the params object.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.as_ref().and_then(|p| p.get(key))
    }
}

/// JSON-RPC response message. Exactly one of `result`/`error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC notification (no `id`, no response expected).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: Some(params),
        }
    }
}

/// Request ID - can be string, number, or null.
///
/// Numbers keep their exact JSON text (`arbitrary_precision`), so `1e2` and
/// integers past `u64::MAX` are echoed unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(serde_json::Number),
    #[default]
    Null,
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n.into())
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl RequestId {
    /// Read an id out of a raw JSON value. Objects, arrays and booleans are not ids.
    fn from_value(value: Option<&Value>) -> Option<Self> {
        match value {
            None | Some(Value::Null) => Some(RequestId::Null),
            Some(Value::String(s)) => Some(RequestId::String(s.clone())),
            Some(Value::Number(n)) => Some(RequestId::Number(n.clone())),
            Some(_) => None,
        }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// Standard JSON-RPC error codes
impl JsonRpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Start of the implementation-defined server error range (-32000..=-32099).
    pub const SERVER_ERROR: i32 = -32000;
    pub const TIMEOUT: i32 = -32001;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(msg: &str) -> Self {
        Self::new(Self::PARSE_ERROR, format!("Parse error: {}", msg))
    }

    pub fn invalid_request(msg: &str) -> Self {
        Self::new(Self::INVALID_REQUEST, format!("Invalid request: {}", msg))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(Self::METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(msg: &str) -> Self {
        Self::new(Self::INVALID_PARAMS, format!("Invalid params: {}", msg))
    }

    pub fn internal_error(msg: &str) -> Self {
        Self::new(Self::INTERNAL_ERROR, format!("Internal error: {}", msg))
    }

    pub fn server_error(msg: &str) -> Self {
        Self::new(Self::SERVER_ERROR, format!("Server error: {}", msg))
    }

    /// Whether the code lies in the reserved server error range.
    pub fn is_server_error(&self) -> bool {
        (-32099..=-32000).contains(&self.code)
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for JsonRpcError {}

impl JsonRpcResponse {
    /// Create a successful response.
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: RequestId, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// ============================================================================
// Envelope codec
// ============================================================================

/// Build a success envelope.
pub fn encode_success(id: RequestId, value: Value) -> JsonRpcResponse {
    JsonRpcResponse::success(id, value)
}

/// Build an error envelope. The code defaults to `INTERNAL_ERROR`.
pub fn encode_error(
    id: RequestId,
    code: Option<i32>,
    message: impl Into<String>,
    data: Option<Value>,
) -> JsonRpcResponse {
    JsonRpcResponse::error(
        id,
        JsonRpcError {
            code: code.unwrap_or(JsonRpcError::INTERNAL_ERROR),
            message: message.into(),
            data,
        },
    )
}

/// A request that could not be decoded, with whatever id could be recovered.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRejection {
    pub id: RequestId,
    pub error: JsonRpcError,
}

impl RequestRejection {
    fn new(id: RequestId, error: JsonRpcError) -> Self {
        Self { id, error }
    }

    pub fn is_parse_error(&self) -> bool {
        self.error.code == JsonRpcError::PARSE_ERROR
    }

    pub fn into_response(self) -> JsonRpcResponse {
        JsonRpcResponse::error(self.id, self.error)
    }
}

/// Parse a raw body as JSON. Malformed input is a `PARSE_ERROR` rejection.
pub fn parse_json(raw: &[u8]) -> Result<Value, RequestRejection> {
    serde_json::from_slice(raw).map_err(|e| {
        RequestRejection::new(RequestId::Null, JsonRpcError::parse_error(&e.to_string()))
    })
}

/// Parse a raw body and decode it as a request.
pub fn decode_request_slice(raw: &[u8]) -> Result<JsonRpcRequest, RequestRejection> {
    decode_request(parse_json(raw)?)
}

/// Parse raw text and decode it as a request.
pub fn decode_request_str(raw: &str) -> Result<JsonRpcRequest, RequestRejection> {
    decode_request_slice(raw.as_bytes())
}

/// Validate a JSON value as a JSON-RPC request.
///
/// Legacy `{action_id, parameters}` bodies are translated and skip the
/// `jsonrpc` version check.
pub fn decode_request(raw: Value) -> Result<JsonRpcRequest, RequestRejection> {
    let mut obj = match raw {
        Value::Object(obj) => obj,
        Value::Array(_) => {
            return Err(RequestRejection::new(
                RequestId::Null,
                JsonRpcError::invalid_request("batch requests are not supported"),
            ))
        }
        _ => {
            return Err(RequestRejection::new(
                RequestId::Null,
                JsonRpcError::invalid_request("body must be a JSON object"),
            ))
        }
    };

    let id = RequestId::from_value(obj.get("id")).ok_or_else(|| {
        RequestRejection::new(
            RequestId::Null,
            JsonRpcError::invalid_request("id must be a string, number or null"),
        )
    })?;

    if !obj.contains_key("method") && obj.contains_key("action_id") {
        return decode_legacy(id, &mut obj);
    }

    if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(RequestRejection::new(
            id,
            JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
        ));
    }

    let method = match obj.get("method") {
        Some(Value::String(m)) if !m.is_empty() => m.clone(),
        _ => {
            return Err(RequestRejection::new(
                id,
                JsonRpcError::invalid_request("method must be a non-empty string"),
            ))
        }
    };

    let params = obj.remove("params").filter(|p| !p.is_null());

    Ok(JsonRpcRequest::new(id, method, params))
}

fn decode_legacy(
    id: RequestId,
    obj: &mut Map<String, Value>,
) -> Result<JsonRpcRequest, RequestRejection> {
    let method = match obj.get("action_id") {
        Some(Value::String(a)) if !a.is_empty() => a.clone(),
        _ => {
            return Err(RequestRejection::new(
                id,
                JsonRpcError::invalid_request("action_id must be a non-empty string"),
            ))
        }
    };

    let params = obj.remove("parameters").filter(|p| !p.is_null());

    Ok(JsonRpcRequest::new(id, method, params))
}

/// Decode a response envelope into its payload or its error.
///
/// Older servers put the payload under `params` instead of `result`; both are
/// accepted.
pub fn decode_response(raw: Value) -> Result<Value, JsonRpcError> {
    let Value::Object(mut obj) = raw else {
        return Err(JsonRpcError::invalid_request("response must be a JSON object"));
    };

    if let Some(error) = obj.remove("error").filter(|e| !e.is_null()) {
        return Err(serde_json::from_value(error.clone()).unwrap_or_else(|_| {
            JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, error.to_string())
        }));
    }

    obj.remove("result")
        .or_else(|| obj.remove("params"))
        .ok_or_else(|| JsonRpcError::invalid_request("response carries neither result nor error"))
}

// ============================================================================
// MCP-specific types
// ============================================================================

/// MCP initialization response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

/// Server capabilities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    #[serde(default)]
    pub list_changed: bool,
}

/// Server info.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl ServerInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Tool call request params (`tools/call` and its aliases).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Tool call result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<ToolResultContent>,
    pub is_error: bool,
}

/// Content in tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolResultContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolCallResult {
    /// Create a successful text result.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResultContent::Text {
                text: content.into(),
            }],
            is_error: false,
        }
    }

    /// Create an error result.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResultContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }
}
