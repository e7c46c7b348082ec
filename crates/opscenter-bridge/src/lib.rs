//! Client for the accounting MCP bridge.
//!
//! The bridge is a separate process that exposes accounting operations as
//! MCP tools. The gateway only ever issues `tools/call` over JSON-RPC 2.0
//! (`POST {bridge_url}/mcp`). There are no retries: a failed call fails the
//! request.

pub mod client;
pub mod error;
pub mod protocol;

pub use client::{FinanceBridge, HttpBridgeClient};
pub use error::BridgeError;
pub use protocol::{CallToolParams, CallToolResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
