//! MCP gateway for gitbridge.
//!
//! This crate implements the protocol layer that exposes GitHub data and
//! LLM analysis to AI assistants: the JSON-RPC envelope codec, the tool
//! registry, the upstream invoker, the method dispatcher, SSE sessions and
//! the HTTP and stdio transports.

pub mod analysis;
pub mod dispatcher;
pub mod http;
pub mod invoker;
pub mod protocol;
pub mod registry;
pub mod sse;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use analysis::RepositoryAnalyzer;
pub use dispatcher::Dispatcher;
pub use http::{router, GatewayState};
pub use invoker::UpstreamInvoker;
pub use registry::ToolRegistry;
pub use sse::{SessionTiming, SseSession};
pub use transport::StdioTransport;
