use std::sync::Arc;

use jenkins_mcp::config::JenkinsConfig;
use jenkins_mcp::{Dispatcher, JenkinsClient};

/// Credentials used by every test; `bot:secret` in Basic auth.
#[allow(dead_code)]
pub const AUTH_HEADER: &str = "Basic Ym90OnNlY3JldA==";

/// An address nothing listens on.
#[allow(dead_code)]
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

#[allow(dead_code)]
pub fn jenkins_config(url: &str) -> JenkinsConfig {
    JenkinsConfig {
        url: url.to_string(),
        username: "bot".to_string(),
        api_token: "secret".to_string(),
        timeout_seconds: 5,
        connect_timeout_seconds: 2,
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn client_for(url: &str) -> JenkinsClient {
    JenkinsClient::new(&jenkins_config(url)).expect("failed to build client")
}

#[allow(dead_code)]
pub fn dispatcher_for(url: &str) -> Dispatcher {
    Dispatcher::new(Arc::new(client_for(url)))
}
