//! Method dispatcher.
//!
//! Routes a decoded request to one of a fixed set of methods, runs it
//! against the [`Registry`] and packages the outcome into a response
//! envelope. Each request is handled independently; the dispatcher holds
//! no per-request state and is shared between threads behind an `Arc`.
//!
//! Nothing escapes [`Dispatcher::handle`]: parameter errors, unknown ids,
//! tool failures and panics all come back as JSON-RPC error envelopes that
//! carry the request's correlation id.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::mcp::protocol::{
    parse_message, ErrorCode, JsonRpcError, JsonRpcErrorData, JsonRpcRequest, JsonRpcResponse,
    RequestId, Response, PROTOCOL_VERSION,
};
use crate::registry::{Registry, SchemaError, ToolError};

/// The methods this server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `server.info`
    ServerInfo,
    /// `prompts.list`
    PromptsList,
    /// `prompts.get`
    PromptsGet,
    /// `tools.list`
    ToolsList,
    /// `tools.call`
    ToolsCall,
    /// `resources.list`
    ResourcesList,
    /// `resources.get`
    ResourcesGet,
    /// `ping`
    Ping,
}

impl Method {
    /// Every method, in the order they are documented.
    pub const ALL: [Self; 8] = [
        Self::ServerInfo,
        Self::PromptsList,
        Self::PromptsGet,
        Self::ToolsList,
        Self::ToolsCall,
        Self::ResourcesList,
        Self::ResourcesGet,
        Self::Ping,
    ];

    /// Resolves a method name.
    ///
    /// Matching is exact. Each method is also accepted with an `mcp.` prefix.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let method = match name {
            "server.info" | "mcp.server.info" => Self::ServerInfo,
            "prompts.list" | "mcp.prompts.list" => Self::PromptsList,
            "prompts.get" | "mcp.prompts.get" => Self::PromptsGet,
            "tools.list" | "mcp.tools.list" => Self::ToolsList,
            "tools.call" | "mcp.tools.call" => Self::ToolsCall,
            "resources.list" | "mcp.resources.list" => Self::ResourcesList,
            "resources.get" | "mcp.resources.get" => Self::ResourcesGet,
            "ping" | "mcp.ping" => Self::Ping,
            _ => return None,
        };
        Some(method)
    }

    /// Canonical method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServerInfo => "server.info",
            Self::PromptsList => "prompts.list",
            Self::PromptsGet => "prompts.get",
            Self::ToolsList => "tools.list",
            Self::ToolsCall => "tools.call",
            Self::ResourcesList => "resources.list",
            Self::ResourcesGet => "resources.get",
            Self::Ping => "ping",
        }
    }
}

/// Identity reported by `server.info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
    /// Human-readable description.
    pub description: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: env!("CARGO_PKG_DESCRIPTION").to_string(),
        }
    }
}

/// Server capabilities advertised by `server.info`.
///
/// A capability appears only if its store has at least one entry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerCapabilities {
    /// Prompt-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<CapabilityFlags>,
    /// Tool-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<CapabilityFlags>,
    /// Resource-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<CapabilityFlags>,
}

impl ServerCapabilities {
    fn from_registry(registry: &Registry) -> Self {
        let flag = |count: usize| (count > 0).then(CapabilityFlags::default);
        Self {
            prompts: flag(registry.prompt_count()),
            tools: flag(registry.tool_count()),
            resources: flag(registry.resource_count()),
        }
    }
}

/// Per-capability flags.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CapabilityFlags {
    /// Whether the list can change during the session. Always false here.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Why a request failed, before it is turned into an envelope.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The method name is not in the table.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// A required parameter is missing or malformed.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// No prompt with this id.
    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    /// No tool with this name.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// No resource with this id.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The call arguments failed schema validation.
    #[error("Invalid arguments for tool '{tool}': {source}")]
    InvalidArguments {
        /// Tool name.
        tool: String,
        /// The validation failure.
        #[source]
        source: SchemaError,
    },

    /// The tool handler returned an error.
    #[error("Tool execution error in '{tool}': {source}")]
    ToolFailed {
        /// Tool name.
        tool: String,
        /// What the handler reported.
        #[source]
        source: ToolError,
    },

    /// The tool handler panicked.
    #[error("Tool execution error in '{tool}': panicked: {message}")]
    ToolPanicked {
        /// Tool name.
        tool: String,
        /// The panic payload, if it was a string.
        message: String,
    },

    /// Anything unanticipated.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// The JSON-RPC error code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MethodNotFound(_) => ErrorCode::MethodNotFound,
            Self::InvalidParams(_)
            | Self::PromptNotFound(_)
            | Self::ToolNotFound(_)
            | Self::ResourceNotFound(_)
            | Self::InvalidArguments { .. }
            | Self::ToolFailed {
                source: ToolError::InvalidArguments(_),
                ..
            } => ErrorCode::InvalidParams,
            Self::ToolFailed { .. } | Self::ToolPanicked { .. } | Self::Internal(_) => {
                ErrorCode::InternalError
            }
        }
    }

    /// Converts the failure into an error envelope for `id`.
    #[must_use]
    pub fn into_error(self, id: RequestId) -> JsonRpcError {
        let mut data = JsonRpcErrorData::with_message(self.code(), self.to_string());
        match &self {
            Self::InvalidArguments { tool, .. }
            | Self::ToolFailed { tool, .. }
            | Self::ToolPanicked { tool, .. } => {
                data = data.with_data(json!({ "tool": tool }));
            }
            _ => {}
        }
        JsonRpcError::new(id, data)
    }
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Reads a required, non-empty string parameter.
fn required_str<'a>(params: Option<&'a Value>, key: &str) -> Result<&'a str, DispatchError> {
    let params = match params {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(_) => {
            return Err(DispatchError::InvalidParams(
                "params must be an object".to_string(),
            ))
        }
    };

    match params.and_then(|p| p.get(key)) {
        None | Some(Value::Null) => Err(DispatchError::InvalidParams(format!("missing {key}"))),
        Some(Value::String(s)) if s.is_empty() => {
            Err(DispatchError::InvalidParams(format!("missing {key}")))
        }
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(DispatchError::InvalidParams(format!(
            "{key} must be a string"
        ))),
    }
}

/// Routes requests to the registry.
#[derive(Debug)]
pub struct Dispatcher {
    info: ServerInfo,
    registry: Registry,
}

impl Dispatcher {
    /// Creates a dispatcher that owns `registry`.
    #[must_use]
    pub const fn new(info: ServerInfo, registry: Registry) -> Self {
        Self { info, registry }
    }

    /// The registry requests are served from.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The identity reported by `server.info`.
    #[must_use]
    pub const fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Handles one raw line of input.
    ///
    /// Undecodable input yields a parse or invalid request error.
    #[must_use]
    pub fn handle_line(&self, line: &str) -> Response {
        match parse_message(line) {
            Ok(request) => self.handle(request),
            Err(error) => {
                tracing::warn!(code = error.error.code, "Rejected malformed request");
                error.into()
            }
        }
    }

    /// Handles a decoded request.
    #[must_use]
    pub fn handle(&self, request: JsonRpcRequest) -> Response {
        let JsonRpcRequest { id, method, params } = request;
        self.call(&method, params.as_ref(), id)
    }

    /// Runs `method` with `params` and wraps the outcome for `id`.
    #[must_use]
    pub fn call(&self, method: &str, params: Option<&Value>, id: RequestId) -> Response {
        tracing::debug!(method, id = %id, "Dispatching request");

        let outcome = catch_unwind(AssertUnwindSafe(|| self.route(method, params)))
            .unwrap_or_else(|payload| {
                Err(DispatchError::Internal(panic_message(payload.as_ref())))
            });

        match outcome {
            Ok(result) => JsonRpcResponse::success(id, result).into(),
            Err(error) => {
                tracing::debug!(method, id = %id, error = %error, "Request failed");
                error.into_error(id).into()
            }
        }
    }

    fn route(&self, method: &str, params: Option<&Value>) -> Result<Value, DispatchError> {
        let Some(resolved) = Method::parse(method) else {
            return Err(DispatchError::MethodNotFound(method.to_string()));
        };

        match resolved {
            Method::ServerInfo => Ok(self.server_info()),
            Method::PromptsList => Ok(self.prompts_list()),
            Method::PromptsGet => self.prompts_get(params),
            Method::ToolsList => Ok(self.tools_list()),
            Method::ToolsCall => self.tools_call(params),
            Method::ResourcesList => Ok(self.resources_list()),
            Method::ResourcesGet => self.resources_get(params),
            Method::Ping => Ok(json!({})),
        }
    }

    fn server_info(&self) -> Value {
        json!({
            "name": self.info.name,
            "version": self.info.version,
            "description": self.info.description,
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::from_registry(&self.registry),
        })
    }

    fn prompts_list(&self) -> Value {
        self.registry
            .list_prompts()
            .map(|p| {
                json!({
                    "id": p.id,
                    "name": p.name,
                    "description": p.description,
                })
            })
            .collect()
    }

    fn prompts_get(&self, params: Option<&Value>) -> Result<Value, DispatchError> {
        let id = required_str(params, "id")?;
        let prompt = self
            .registry
            .get_prompt(id)
            .ok_or_else(|| DispatchError::PromptNotFound(id.to_string()))?;

        let mut result = json!({
            "id": prompt.id,
            "name": prompt.name,
            "description": prompt.description,
            "prompt": prompt.template,
        });
        if !prompt.parameters.is_empty() {
            result["parameters"] = json!(prompt.parameters);
        }
        Ok(result)
    }

    fn tools_list(&self) -> Value {
        self.registry
            .list_tools()
            .map(|t| {
                json!({
                    "name": t.name(),
                    "description": t.description(),
                    "schema": t.schema(),
                })
            })
            .collect()
    }

    fn tools_call(&self, params: Option<&Value>) -> Result<Value, DispatchError> {
        let name = required_str(params, "name")?;
        let tool = self
            .registry
            .get_tool(name)
            .ok_or_else(|| DispatchError::ToolNotFound(name.to_string()))?;

        let arguments = params.and_then(|p| p.get("arguments"));
        let args = tool
            .schema()
            .validate(arguments)
            .map_err(|source| DispatchError::InvalidArguments {
                tool: name.to_string(),
                source,
            })?;

        tracing::debug!(tool = %name, "Calling tool");

        match catch_unwind(AssertUnwindSafe(|| tool.execute(&args))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => {
                tracing::warn!(tool = %name, error = %source, "Tool returned an error");
                Err(DispatchError::ToolFailed {
                    tool: name.to_string(),
                    source,
                })
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(tool = %name, panic = %message, "Tool panicked");
                Err(DispatchError::ToolPanicked {
                    tool: name.to_string(),
                    message,
                })
            }
        }
    }

    fn resources_list(&self) -> Value {
        self.registry
            .list_resources()
            .map(crate::registry::Resource::summary)
            .collect()
    }

    fn resources_get(&self, params: Option<&Value>) -> Result<Value, DispatchError> {
        let id = required_str(params, "id")?;
        self.registry
            .get_resource(id)
            .map(crate::registry::Resource::to_value)
            .ok_or_else(|| DispatchError::ResourceNotFound(id.to_string()))
    }
}
