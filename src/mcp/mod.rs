//! MCP (Model Context Protocol) server support
//!
//! # Module Layout
//!
//! - `types`  -- JSON-RPC 2.0 primitives and the MCP initialize, tools and
//!   resources shapes
//! - `server` -- Newline-delimited stdio loop that routes requests to the
//!   [`crate::dispatcher::Dispatcher`]

pub mod server;
pub mod types;

pub use server::McpServer;
