//! capability-mcp: a JSON-RPC 2.0 capability server for MCP clients.
//!
//! The server exposes three kinds of capability to a language-model client:
//!
//! - **Prompts**: named templates with `{placeholder}` parameters
//! - **Tools**: named operations with a declared argument schema
//! - **Resources**: named pieces of text or binary content
//!
//! Requests arrive as newline-delimited JSON on stdin; each one is routed
//! by method name and answered with exactly one success or error envelope
//! carrying the request's id.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`error`]: Error types
//! - [`mcp`]: Protocol types, dispatcher and stdio server
//! - [`registry`]: Prompt, tool and resource stores, argument schemas
//! - [`store`]: File-backed prompt storage
//! - [`tools`]: Built-in tool catalog

pub mod config;
pub mod error;
pub mod mcp;
pub mod registry;
pub mod store;
pub mod tools;
