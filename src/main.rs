//! jenkins-mcp - MCP server for Jenkins
//!
#![doc = "jenkins-mcp - MCP server for Jenkins"]
#![doc = "Main entry point: loads configuration, checks Jenkins and serves MCP on stdio."]

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jenkins_mcp::cli::{Cli, Commands};
use jenkins_mcp::config::Config;
use jenkins_mcp::format;
use jenkins_mcp::jenkins::{JenkinsApi, JenkinsClient, ServerInfo};
use jenkins_mcp::{Dispatcher, JenkinsMcpError, McpServer};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // stdout carries protocol frames, so logs go to stderr
    init_tracing(cli.verbose, cli.json_logs);

    let config = Config::load(cli.config.as_deref(), &cli)?;
    config.validate()?;

    let client = Arc::new(JenkinsClient::new(&config.jenkins)?);

    match cli.command() {
        Commands::Check => {
            let info = connection_check(client.as_ref()).await?;
            println!("{}", format::render_connection(&info));
            Ok(())
        }
        Commands::Serve => {
            if config.server.skip_startup_check {
                warn!("Skipping startup connection check");
            } else {
                connection_check(client.as_ref()).await?;
            }

            let server = McpServer::new(Dispatcher::new(client), &config.server.name);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            server.run(stdin, tokio::io::stdout()).await
        }
    }
}

/// Probe Jenkins once; any failure is fatal at startup.
async fn connection_check(client: &JenkinsClient) -> Result<ServerInfo> {
    info!(url = %client.base_url(), "Checking Jenkins connection");
    match client.test_connection().await {
        Ok(info) => {
            info!(
                version = info.version.as_deref().unwrap_or("unknown"),
                "Jenkins connection established"
            );
            Ok(info)
        }
        Err(e) => {
            error!(error = %e, "Jenkins connection check failed");
            if e.is_connectivity() {
                warn!("{}", format::VPN_HINT);
            }
            Err(JenkinsMcpError::from(e).into())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose {
        "jenkins_mcp=debug"
    } else {
        "jenkins_mcp=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
