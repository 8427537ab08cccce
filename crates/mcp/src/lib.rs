// MCP (Model Context Protocol) server exposing the portfolio tools
// to agent clients over stdio or HTTP

pub mod codec;
pub mod protocol;
pub mod server;
pub mod telemetry;
pub mod tools;

pub use server::McpServer;
pub use telemetry::{init_tracing, LogFormat, LogTarget};

/// Server name announced to clients when none is configured
pub const DEFAULT_SERVER_NAME: &str = "sp500-portfolio-analysis";
