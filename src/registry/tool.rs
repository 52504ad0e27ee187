//! The tool capability interface.

use serde_json::Value;
use thiserror::Error;

use crate::registry::schema::{ToolSchema, ValidatedArgs};

/// Failure reported by a tool handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The arguments passed validation but make no sense to the tool.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool ran and failed.
    #[error("{0}")]
    Failed(String),
}

/// A named server-side callable with a declared argument schema.
///
/// Implementations must be `Send + Sync`: the dispatcher may invoke the same
/// tool from several threads at once. Any mutable state a tool keeps must
/// carry its own locking.
pub trait Tool: Send + Sync {
    /// Unique name used by `tools.call`.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Argument schema checked before every call.
    fn schema(&self) -> &ToolSchema;

    /// Runs the tool.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] when the call cannot produce a result.
    fn execute(&self, args: &ValidatedArgs) -> Result<Value, ToolError>;
}

impl std::fmt::Debug for dyn Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool").field("name", &self.name()).finish()
    }
}
