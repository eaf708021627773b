//! Configuration management for jenkins-mcp
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from an optional YAML file, environment variables, and CLI
//! overrides. Later sources win: file, then environment, then CLI.

use crate::error::{JenkinsMcpError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Main configuration structure for jenkins-mcp
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connection settings for the Jenkins server
    #[serde(default)]
    pub jenkins: JenkinsConfig,

    /// MCP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Jenkins connection configuration
///
/// `url`, `username` and `api_token` are required; the client refuses to
/// start with any of them empty.
#[derive(Clone, Serialize, Deserialize)]
pub struct JenkinsConfig {
    /// Base URL of the Jenkins server (e.g. `https://ci.example.com`)
    #[serde(default)]
    pub url: String,

    /// Jenkins user name
    #[serde(default)]
    pub username: String,

    /// Jenkins API token for `username`
    #[serde(default)]
    pub api_token: String,

    /// Overall request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Connection-establish timeout in seconds
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Accept any TLS certificate presented by the server.
    ///
    /// Trust-boundary decision for operators: enable only for internal
    /// Jenkins instances with self-signed certificates, and only on a
    /// network you trust. Defaults to verifying certificates.
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_connect_timeout_seconds() -> u64 {
    10
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            api_token: String::new(),
            timeout_seconds: default_timeout_seconds(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            insecure_skip_tls_verify: false,
        }
    }
}

impl fmt::Debug for JenkinsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JenkinsConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("api_token", &"<redacted>")
            .field("timeout_seconds", &self.timeout_seconds)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .field("insecure_skip_tls_verify", &self.insecure_skip_tls_verify)
            .finish()
    }
}

/// MCP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Name reported in the `initialize` response
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Skip the connectivity check performed before serving
    #[serde(default)]
    pub skip_startup_check: bool,
}

fn default_server_name() -> String {
    "jenkins".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            skip_startup_check: false,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Optional path to a YAML configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: Option<&str>, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = match path {
            Some(p) if Path::new(p).exists() => Self::from_file(p)?,
            Some(p) => {
                tracing::warn!("Config file not found at {}, using defaults", p);
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(JenkinsMcpError::from)?;
        let config = serde_yaml::from_str(&contents).map_err(JenkinsMcpError::from)?;
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("JENKINS_URL") {
            self.jenkins.url = url;
        }

        if let Ok(username) = std::env::var("JENKINS_USERNAME") {
            self.jenkins.username = username;
        }

        if let Ok(token) = std::env::var("JENKINS_API_TOKEN") {
            self.jenkins.api_token = token;
        }

        if let Ok(timeout) = std::env::var("JENKINS_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(v) => self.jenkins.timeout_seconds = v,
                Err(_) => tracing::warn!("Invalid JENKINS_TIMEOUT_SECONDS: {}", timeout),
            }
        }

        if let Ok(timeout) = std::env::var("JENKINS_CONNECT_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(v) => self.jenkins.connect_timeout_seconds = v,
                Err(_) => tracing::warn!("Invalid JENKINS_CONNECT_TIMEOUT_SECONDS: {}", timeout),
            }
        }

        if let Ok(insecure) = std::env::var("JENKINS_INSECURE_SKIP_TLS_VERIFY") {
            match insecure.parse::<bool>() {
                Ok(v) => {
                    self.jenkins.insecure_skip_tls_verify = v;
                    tracing::debug!(
                        insecure_skip_tls_verify = v,
                        "Env override: JENKINS_INSECURE_SKIP_TLS_VERIFY"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for JENKINS_INSECURE_SKIP_TLS_VERIFY: {}",
                        insecure
                    );
                }
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(url) = &cli.url {
            self.jenkins.url = url.clone();
        }

        if let Some(username) = &cli.username {
            self.jenkins.username = username.clone();
        }

        if cli.insecure {
            self.jenkins.insecure_skip_tls_verify = true;
        }

        if cli.skip_startup_check {
            self.server.skip_startup_check = true;
        }

        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// Ensures the three connection parameters are present, the base URL is
    /// an http(s) URL, and the timeouts are non-zero.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("JENKINS_URL", &self.jenkins.url),
            ("JENKINS_USERNAME", &self.jenkins.username),
            ("JENKINS_API_TOKEN", &self.jenkins.api_token),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(JenkinsMcpError::Config(format!(
                "Jenkins connection settings are missing: {}",
                missing.join(", ")
            ))
            .into());
        }

        let parsed = url::Url::parse(&self.jenkins.url).map_err(|e| {
            JenkinsMcpError::Config(format!("Invalid Jenkins URL {}: {}", self.jenkins.url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(JenkinsMcpError::Config(format!(
                "Jenkins URL must use http or https, got {}",
                parsed.scheme()
            ))
            .into());
        }

        if self.jenkins.timeout_seconds == 0 {
            return Err(JenkinsMcpError::Config(
                "jenkins.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.jenkins.connect_timeout_seconds == 0 {
            return Err(JenkinsMcpError::Config(
                "jenkins.connect_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.server.name.is_empty() {
            return Err(
                JenkinsMcpError::Config("server.name cannot be empty".to_string()).into(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use serial_test::serial;

    const ENV_VARS: &[&str] = &[
        "JENKINS_URL",
        "JENKINS_USERNAME",
        "JENKINS_API_TOKEN",
        "JENKINS_TIMEOUT_SECONDS",
        "JENKINS_CONNECT_TIMEOUT_SECONDS",
        "JENKINS_INSECURE_SKIP_TLS_VERIFY",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    fn valid_config() -> Config {
        Config {
            jenkins: JenkinsConfig {
                url: "https://ci.example.com".to_string(),
                username: "bot".to_string(),
                api_token: "secret".to_string(),
                ..Default::default()
            },
            server: ServerConfig::default(),
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.jenkins.timeout_seconds, 30);
        assert_eq!(config.jenkins.connect_timeout_seconds, 10);
        assert!(!config.jenkins.insecure_skip_tls_verify);
        assert_eq!(config.server.name, "jenkins");
        assert!(!config.server.skip_startup_check);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_reports_all_missing_settings() {
        let config = Config::default();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("JENKINS_URL"));
        assert!(err.contains("JENKINS_USERNAME"));
        assert!(err.contains("JENKINS_API_TOKEN"));
    }

    #[test]
    fn test_config_validation_blank_token() {
        let mut config = valid_config();
        config.jenkins.api_token = "   ".to_string();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("JENKINS_API_TOKEN"));
        assert!(!err.contains("JENKINS_URL"));
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = valid_config();
        config.jenkins.url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.jenkins.url = "ftp://ci.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeouts() {
        let mut config = valid_config();
        config.jenkins.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.jenkins.connect_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = valid_config();
        let debug = format!("{:?}", config.jenkins);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
jenkins:
  url: https://jenkins.internal:8443
  username: deploy
  api_token: abc123
  timeout_seconds: 60
  insecure_skip_tls_verify: true
server:
  name: ci
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.jenkins.url, "https://jenkins.internal:8443");
        assert_eq!(config.jenkins.timeout_seconds, 60);
        assert_eq!(config.jenkins.connect_timeout_seconds, 10);
        assert!(config.jenkins.insecure_skip_tls_verify);
        assert_eq!(config.server.name, "ci");
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_env() {
        clear_env();
        std::env::set_var("JENKINS_URL", "https://env.example.com");
        std::env::set_var("JENKINS_USERNAME", "env-user");
        std::env::set_var("JENKINS_API_TOKEN", "env-token");

        let cli = Cli::try_parse_from(["jenkins-mcp"]).unwrap();
        let config = Config::load(Some("/nonexistent/jenkins-mcp.yaml"), &cli).unwrap();
        assert_eq!(config.jenkins.url, "https://env.example.com");
        assert_eq!(config.jenkins.username, "env-user");
        assert_eq!(config.jenkins.api_token, "env-token");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_and_cli_overrides_env() {
        clear_env();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "jenkins:\n  url: https://file.example.com\n  username: file-user\n  api_token: file-token\n",
        )
        .unwrap();

        std::env::set_var("JENKINS_USERNAME", "env-user");
        std::env::set_var("JENKINS_TIMEOUT_SECONDS", "45");
        std::env::set_var("JENKINS_CONNECT_TIMEOUT_SECONDS", "soon");

        let cli =
            Cli::try_parse_from(["jenkins-mcp", "--url", "https://cli.example.com", "--insecure"])
                .unwrap();
        let config = Config::load(path.to_str(), &cli).unwrap();

        assert_eq!(config.jenkins.url, "https://cli.example.com");
        assert_eq!(config.jenkins.username, "env-user");
        assert_eq!(config.jenkins.api_token, "file-token");
        assert_eq!(config.jenkins.timeout_seconds, 45);
        // Unparseable values are ignored with a warning
        assert_eq!(config.jenkins.connect_timeout_seconds, 10);
        assert!(config.jenkins.insecure_skip_tls_verify);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_rejects_malformed_file() {
        clear_env();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "jenkins: [not, a, map]\n").unwrap();

        let cli = Cli::try_parse_from(["jenkins-mcp"]).unwrap();
        let err = Config::load(path.to_str(), &cli).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
        assert!(matches!(
            err.downcast_ref::<JenkinsMcpError>(),
            Some(JenkinsMcpError::Yaml(_))
        ));
    }

    #[test]
    #[serial]
    fn test_load_reports_unreadable_file() {
        clear_env();
        let dir = tempfile::TempDir::new().unwrap();

        // A directory exists but cannot be read as a file
        let cli = Cli::try_parse_from(["jenkins-mcp"]).unwrap();
        let err = Config::load(dir.path().to_str(), &cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JenkinsMcpError>(),
            Some(JenkinsMcpError::Io(_))
        ));
        assert!(err.to_string().starts_with("IO error"));
    }
}
