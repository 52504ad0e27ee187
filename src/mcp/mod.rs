//! Protocol layer: envelopes, dispatch and the stdio server.
//!
//! # Architecture
//!
//! ```text
//!  stdin ──▶ LineReader ──▶ spawn_blocking ──▶ Dispatcher ──▶ Registry
//!                              (per line)          │          prompts
//!                                                  │          tools
//!                                                  ▼          resources
//!  stdout ◀── LineWriter ◀──── mpsc ◀──────── Response
//! ```
//!
//! Every line gets exactly one response. Responses are written in
//! completion order, not arrival order.

pub mod dispatcher;
pub mod protocol;
pub mod server;
pub mod transport;

pub use dispatcher::{DispatchError, Dispatcher, Method, ServerInfo};
pub use protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId, Response, PROTOCOL_VERSION,
};
pub use server::McpServer;
pub use transport::{Frame, LineReader, LineWriter};
