//! JSON-RPC 2.0 message types for the capability protocol.
//!
//! # Envelopes
//!
//! - **Request**: `{"jsonrpc":"2.0","method":..,"params":{..},"id":..}`
//! - **Success**: `{"jsonrpc":"2.0","result":..,"id":..}`
//! - **Error**: `{"jsonrpc":"2.0","error":{"code":..,"message":..},"id":..}`
//!
//! The correlation id is opaque: whatever JSON value the client sent is
//! echoed back unchanged, and `null` is used when the request had none or
//! could not be decoded far enough to find it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol revision advertised by `server.info`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// A JSON-RPC 2.0 correlation id.
///
/// Any JSON value is accepted and echoed verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub Value);

impl RequestId {
    /// The `null` id used when the request carried none.
    #[must_use]
    pub const fn null() -> Self {
        Self(Value::Null)
    }

    /// Returns `true` if the id is `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self(Value::from(n))
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(Value::from(s))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => write!(f, "{s}"),
            other => write!(f, "{other}"),
        }
    }
}

/// A decoded JSON-RPC 2.0 request.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    /// Correlation id (`null` when absent).
    pub id: RequestId,

    /// The method to invoke.
    pub method: String,

    /// Optional parameters for the method.
    pub params: Option<Value>,
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The result of the method call.
    pub result: Value,

    /// The request ID this response corresponds to.
    pub id: RequestId,
}

impl JsonRpcResponse {
    /// Creates a new success response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Value is not const-compatible
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            result,
            id,
        }
    }
}

/// Standard JSON-RPC 2.0 error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received by the server.
    ParseError,
    /// The JSON sent is not a valid Request object.
    InvalidRequest,
    /// The method does not exist or is not available.
    MethodNotFound,
    /// Invalid method parameters.
    InvalidParams,
    /// Internal JSON-RPC error.
    InternalError,
}

impl ErrorCode {
    /// Returns the numeric code for this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }

    /// Returns the default message for this error code.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,

    /// Additional information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorData {
    /// Creates a new error from an error code.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.default_message().to_string(),
            data: None,
        }
    }

    /// Creates a new error with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Adds additional data to the error.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// A JSON-RPC 2.0 error response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The error details.
    pub error: JsonRpcErrorData,

    /// The request ID this error corresponds to (`null` if unknown).
    pub id: RequestId,
}

impl JsonRpcError {
    /// Creates a new error response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JsonRpcErrorData contains String
    pub fn new(id: RequestId, error: JsonRpcErrorData) -> Self {
        Self {
            jsonrpc: "2.0",
            error,
            id,
        }
    }

    /// Creates a parse error response (ID cannot be determined).
    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(
            RequestId::null(),
            JsonRpcErrorData::from_code(ErrorCode::ParseError),
        )
    }

    /// Creates an invalid request error response.
    #[must_use]
    pub fn invalid_request(id: RequestId) -> Self {
        Self::new(id, JsonRpcErrorData::from_code(ErrorCode::InvalidRequest))
    }
}

/// Any outgoing response envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// `result` envelope.
    Success(JsonRpcResponse),
    /// `error` envelope.
    Error(JsonRpcError),
}

impl Response {
    /// The correlation id carried by this response.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        match self {
            Self::Success(resp) => &resp.id,
            Self::Error(err) => &err.id,
        }
    }

    /// The result value, if this is a success.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        match self {
            Self::Success(resp) => Some(&resp.result),
            Self::Error(_) => None,
        }
    }

    /// The error object, if this is an error.
    #[must_use]
    pub const fn error(&self) -> Option<&JsonRpcErrorData> {
        match self {
            Self::Success(_) => None,
            Self::Error(err) => Some(&err.error),
        }
    }
}

impl From<JsonRpcResponse> for Response {
    fn from(resp: JsonRpcResponse) -> Self {
        Self::Success(resp)
    }
}

impl From<JsonRpcError> for Response {
    fn from(err: JsonRpcError) -> Self {
        Self::Error(err)
    }
}

/// Validates a decoded JSON value as a request envelope.
///
/// A missing or non-string `method` yields an invalid request error with a
/// `null` id. A `jsonrpc` member other than `"2.0"` yields an invalid request
/// error that still echoes the id. The `jsonrpc` member may be omitted.
///
/// # Errors
///
/// Returns a `JsonRpcError` if the value is not a well-formed request.
pub fn decode_request(value: Value) -> Result<JsonRpcRequest, JsonRpcError> {
    let Value::Object(mut obj) = value else {
        return Err(JsonRpcError::invalid_request(RequestId::null()));
    };

    let method = match obj.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        _ => return Err(JsonRpcError::invalid_request(RequestId::null())),
    };

    let id = RequestId(obj.remove("id").unwrap_or(Value::Null));

    if let Some(version) = obj.get("jsonrpc") {
        if version.as_str() != Some("2.0") {
            return Err(JsonRpcError::new(
                id,
                JsonRpcErrorData::with_message(
                    ErrorCode::InvalidRequest,
                    "Invalid Request: jsonrpc must be \"2.0\"",
                ),
            ));
        }
    }

    Ok(JsonRpcRequest {
        id,
        method,
        params: obj.remove("params"),
    })
}

/// Parses a JSON string into a request.
///
/// # Errors
///
/// Returns a parse error if the text is not JSON, otherwise the errors of
/// [`decode_request`].
pub fn parse_message(json: &str) -> Result<JsonRpcRequest, JsonRpcError> {
    let value: Value = serde_json::from_str(json).map_err(|_| JsonRpcError::parse_error())?;
    decode_request(value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_valid_request() {
        let json = r#"{"jsonrpc": "2.0", "id": 1, "method": "prompts.list", "params": {}}"#;
        let req = parse_message(json).unwrap();
        assert_eq!(req.id, RequestId::from(1));
        assert_eq!(req.method, "prompts.list");
        assert_eq!(req.params, Some(json!({})));
    }

    #[test]
    fn parse_string_id() {
        let json = r#"{"jsonrpc": "2.0", "id": "abc-123", "method": "test"}"#;
        let req = parse_message(json).unwrap();
        assert_eq!(req.id, RequestId::from("abc-123"));
    }

    #[test]
    fn parse_structured_id_is_kept_verbatim() {
        let json = r#"{"jsonrpc": "2.0", "id": {"seq": [1, 2]}, "method": "test"}"#;
        let req = parse_message(json).unwrap();
        assert_eq!(req.id.0, json!({"seq": [1, 2]}));
    }

    #[test]
    fn missing_id_becomes_null() {
        let req = parse_message(r#"{"jsonrpc": "2.0", "method": "server.info"}"#).unwrap();
        assert!(req.id.is_null());
    }

    #[test]
    fn jsonrpc_member_is_optional() {
        let req = parse_message(r#"{"id": 7, "method": "server.info"}"#).unwrap();
        assert_eq!(req.method, "server.info");
    }

    #[test]
    fn parse_invalid_json() {
        let err = parse_message("not valid json").unwrap_err();
        assert_eq!(err.error.code, ErrorCode::ParseError.code());
        assert!(err.id.is_null());
    }

    #[test]
    fn missing_method_is_invalid_request_with_null_id() {
        let err = parse_message(r#"{"jsonrpc": "2.0", "id": 5}"#).unwrap_err();
        assert_eq!(err.error.code, -32600);
        assert!(err.id.is_null());
    }

    #[test]
    fn non_string_method_is_invalid_request() {
        let err = parse_message(r#"{"jsonrpc": "2.0", "id": 5, "method": 12}"#).unwrap_err();
        assert_eq!(err.error.code, -32600);
    }

    #[test]
    fn non_object_is_invalid_request() {
        let err = parse_message("[1, 2, 3]").unwrap_err();
        assert_eq!(err.error.code, -32600);
    }

    #[test]
    fn parse_wrong_jsonrpc_version() {
        let err = parse_message(r#"{"jsonrpc": "1.0", "id": 1, "method": "test"}"#).unwrap_err();
        assert_eq!(err.error.code, ErrorCode::InvalidRequest.code());
        assert_eq!(err.id, RequestId::from(1));
    }

    #[test]
    fn serialise_success_response() {
        let response = JsonRpcResponse::success(RequestId::from(1), json!({"ok": true}));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""jsonrpc":"2.0""#));
        assert!(json.contains(r#""id":1"#));
        assert!(json.contains(r#""result":{"ok":true}"#));
    }

    #[test]
    fn serialise_error_response() {
        let error = JsonRpcError::new(
            RequestId::from(1),
            JsonRpcErrorData::with_message(ErrorCode::MethodNotFound, "Method not found: unknown.method"),
        );
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains(r#""code":-32601"#));
        assert!(json.contains("unknown.method"));
        assert!(!json.contains("data"));
    }

    #[test]
    fn error_with_unknown_id_serialises_null() {
        let value = serde_json::to_value(JsonRpcError::parse_error()).unwrap();
        assert_eq!(value["id"], Value::Null);
    }

    #[test]
    fn response_envelope_is_untagged() {
        let value = serde_json::to_value(Response::from(JsonRpcResponse::success(
            RequestId::from("x"),
            json!([1]),
        )))
        .unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "result": [1], "id": "x"}));
    }

    #[test]
    fn request_id_display() {
        assert_eq!(format!("{}", RequestId::from(42)), "42");
        assert_eq!(format!("{}", RequestId::from("abc")), "abc");
        assert_eq!(format!("{}", RequestId::null()), "null");
    }
}
