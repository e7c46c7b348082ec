//! Error types for bridge calls.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Caller-supplied arguments are not a JSON object.
    #[error("tool arguments must be a JSON object")]
    InvalidArguments,

    /// The bridge could not be reached or the connection failed.
    #[error("bridge unreachable: {0}")]
    Transport(String),

    /// The bridge answered with a non-success HTTP status.
    #[error("bridge returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The bridge answered with a JSON-RPC error object.
    #[error("bridge error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// The tool ran but reported failure (`isError: true`).
    #[error("tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    /// The response body was not a usable JSON-RPC result.
    #[error("invalid bridge response: {0}")]
    InvalidResponse(String),
}
