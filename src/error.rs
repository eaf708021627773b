//! Error types for jenkins-mcp
//!
//! This module defines the adapter-level error taxonomy using `thiserror`.
//! Errors raised by the Jenkins HTTP client live in
//! [`crate::jenkins::ClientError`] and are wrapped here unmodified so the
//! dispatcher can render them with their full context.

use thiserror::Error;

use crate::jenkins::ClientError;

/// Main error type for jenkins-mcp operations
///
/// Covers configuration problems detected at startup, argument validation
/// performed by the dispatcher, unknown resources or tools, and every
/// failure the Jenkins client can report.
#[derive(Error, Debug)]
pub enum JenkinsMcpError {
    /// Configuration-related errors (missing credentials, bad values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A tool was called with a missing or malformed argument
    #[error("Invalid arguments: {0}")]
    Validation(String),

    /// Unknown resource URI or tool name
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failure reported by the Jenkins API client
    #[error(transparent)]
    Client(#[from] ClientError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The config file is not valid YAML for [`crate::Config`]
    #[error("Failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl JenkinsMcpError {
    /// Returns true when the failure looks like a reachability problem
    /// (connect timeout, refused connection, DNS failure).
    ///
    /// The dispatcher uses this to append a VPN hint to the rendered message.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, JenkinsMcpError::Client(e) if e.is_connectivity())
    }
}

/// Result type alias for jenkins-mcp bootstrap code
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = JenkinsMcpError::Config("JENKINS_URL is not set".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: JENKINS_URL is not set"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let error = JenkinsMcpError::Validation("job_name is required".to_string());
        assert_eq!(error.to_string(), "Invalid arguments: job_name is required");
    }

    #[test]
    fn test_not_found_error_display() {
        let error = JenkinsMcpError::NotFound("Unknown tool: deploy".to_string());
        assert_eq!(error.to_string(), "Not found: Unknown tool: deploy");
    }

    #[test]
    fn test_client_error_is_transparent() {
        let auth = || ClientError::Authentication {
            context: "job list".to_string(),
        };
        let error: JenkinsMcpError = auth().into();
        assert_eq!(error.to_string(), auth().to_string());
    }

    #[test]
    fn test_connectivity_detection() {
        let error: JenkinsMcpError = ClientError::Connectivity {
            context: "job list".to_string(),
            message: "connection timed out".to_string(),
        }
        .into();
        assert!(error.is_connectivity());

        let error: JenkinsMcpError = ClientError::Permission {
            context: "job list".to_string(),
        }
        .into();
        assert!(!error.is_connectivity());

        let error = JenkinsMcpError::Validation("missing".to_string());
        assert!(!error.is_connectivity());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let error: JenkinsMcpError = json_error.into();
        assert!(matches!(error, JenkinsMcpError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: JenkinsMcpError = yaml_error.into();
        assert!(matches!(error, JenkinsMcpError::Yaml(_)));
        assert!(error.to_string().starts_with("Failed to parse config: "));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<JenkinsMcpError>();
    }
}
