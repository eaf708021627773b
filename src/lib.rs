//! jenkins-mcp - Jenkins adapter for the Model Context Protocol
//!
//! This library exposes a Jenkins server's REST API as MCP resources and
//! tools. An AI assistant can list jobs, inspect builds and console logs,
//! watch the queue and trigger builds through a JSON-RPC session on stdio.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `jenkins`: REST client, the `JenkinsApi` trait and domain models
//! - `catalog`: Static resource and tool tables with input schemas
//! - `dispatcher`: Argument validation, API calls and error normalization
//! - `format`: Human-readable rendering of jobs, builds and errors
//! - `mcp`: JSON-RPC wire types and the stdio server loop
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use jenkins_mcp::{Config, Dispatcher, JenkinsClient, McpServer};
//! use jenkins_mcp::cli::Cli;
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cli = Cli::parse_from(["jenkins-mcp"]);
//!     let config = Config::load(None, &cli)?;
//!     config.validate()?;
//!
//!     let client = JenkinsClient::new(&config.jenkins)?;
//!     let server = McpServer::new(Dispatcher::new(Arc::new(client)), &config.server.name);
//!     let stdin = tokio::io::BufReader::new(tokio::io::stdin());
//!     server.run(stdin, tokio::io::stdout()).await
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod jenkins;
pub mod mcp;

// Re-export commonly used types
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::{JenkinsMcpError, Result};
pub use jenkins::{JenkinsApi, JenkinsClient};
pub use mcp::McpServer;
