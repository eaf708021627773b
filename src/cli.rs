//! Command-line interface definition for jenkins-mcp
//!
//! This module defines the CLI structure using clap's derive API. Connection
//! credentials normally come from the environment; the flags here override
//! the non-secret settings.

use clap::{Parser, Subcommand};

/// jenkins-mcp - MCP server for Jenkins
///
/// Exposes Jenkins jobs, builds and the build queue as MCP resources and
/// tools over stdio.
#[derive(Parser, Debug, Clone)]
#[command(name = "jenkins-mcp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to an optional YAML configuration file
    #[arg(short, long, env = "JENKINS_MCP_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, env = "JENKINS_MCP_JSON_LOGS")]
    pub json_logs: bool,

    /// Override the Jenkins base URL
    #[arg(long)]
    pub url: Option<String>,

    /// Override the Jenkins user name
    #[arg(long)]
    pub username: Option<String>,

    /// Accept self-signed or otherwise invalid TLS certificates
    #[arg(long)]
    pub insecure: bool,

    /// Start serving even if Jenkins is unreachable at startup
    #[arg(long)]
    pub skip_startup_check: bool,

    /// Command to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for jenkins-mcp
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Serve MCP over stdin/stdout
    Serve,

    /// Check connectivity and credentials, then exit
    Check,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The command to run, `serve` when none was given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}
