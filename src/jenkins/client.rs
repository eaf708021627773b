//! Jenkins REST API client.
//!
//! [`JenkinsClient`] performs authenticated HTTP calls against a Jenkins
//! server and returns typed results. It is built once at startup and shared
//! read-only for the lifetime of the process; reqwest's connection pool is
//! reused across calls.
//!
//! # Example
//!
//! ```rust,no_run
//! use jenkins_mcp::config::JenkinsConfig;
//! use jenkins_mcp::jenkins::{JenkinsApi, JenkinsClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = JenkinsConfig {
//!         url: "https://ci.example.com".to_string(),
//!         username: "bot".to_string(),
//!         api_token: "token".to_string(),
//!         ..Default::default()
//!     };
//!     let client = JenkinsClient::new(&config)?;
//!     for job in client.list_jobs().await? {
//!         println!("{} {}", job.name, job.color);
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::JenkinsConfig;
use crate::jenkins::models::{Build, Job, ServerInfo, TriggerOutcome};

/// Field selection for job listings.
const JOBS_TREE: &str = "jobs[name,url,color,buildable,lastBuild[number,url,result,building]]";

/// Field selection for build listings, without the range suffix.
const BUILDS_TREE: &str = "builds[number,url,result,building,duration,timestamp]";

/// Errors that can occur during Jenkins client operations.
///
/// Every variant that comes from a request carries a `context` naming what
/// was being fetched (job, build number) so callers can explain the failure.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Could not establish a connection in time (timeout, refused, DNS).
    #[error("Could not connect to Jenkins ({context}): {message}")]
    Connectivity {
        /// What was being requested.
        context: String,
        /// Underlying transport message.
        message: String,
    },

    /// HTTP 401.
    #[error("Authentication failed ({context}) - check the user name and API token")]
    Authentication {
        /// What was being requested.
        context: String,
    },

    /// HTTP 403.
    #[error("Permission denied ({context}) - check the Jenkins user's permissions")]
    Permission {
        /// What was being requested.
        context: String,
    },

    /// Any other non-2xx status.
    #[error("HTTP error {status} ({context})")]
    Http {
        /// HTTP status code.
        status: u16,
        /// What was being requested.
        context: String,
    },

    /// Transport failure after the connection was established.
    #[error("Network error ({context}): {source}")]
    Network {
        /// What was being requested.
        context: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response from Jenkins ({context}): {message}")]
    Decode {
        /// What was being requested.
        context: String,
        /// Decoder message.
        message: String,
    },

    /// A job name that does not address any job.
    #[error("Invalid job name: {0:?}")]
    InvalidJobName(String),

    /// The client could not be built from its configuration.
    #[error("Invalid Jenkins client configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// True for connect-phase failures and timeouts.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ClientError::Connectivity { .. })
    }

    fn from_reqwest(context: &str, err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ClientError::Connectivity {
                context: context.to_string(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            ClientError::Decode {
                context: context.to_string(),
                message: err.to_string(),
            }
        } else {
            ClientError::Network {
                context: context.to_string(),
                source: err,
            }
        }
    }

    fn from_status(context: &str, status: StatusCode) -> Self {
        let context = context.to_string();
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Authentication { context },
            StatusCode::FORBIDDEN => ClientError::Permission { context },
            other => ClientError::Http {
                status: other.as_u16(),
                context,
            },
        }
    }
}

/// Operations the MCP dispatcher needs from Jenkins.
///
/// [`JenkinsClient`] is the production implementation; tests substitute
/// mocks to observe which calls are (or are not) made.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JenkinsApi: Send + Sync {
    /// `GET /api/json`; fails on any non-2xx status.
    async fn test_connection(&self) -> Result<ServerInfo, ClientError>;

    /// All top-level jobs with their last build reference.
    async fn list_jobs(&self) -> Result<Vec<Job>, ClientError>;

    /// Full, unfiltered job payload.
    async fn get_job_info(&self, job_name: &str) -> Result<JsonValue, ClientError>;

    /// Most recent `limit` builds of a job.
    async fn list_builds(&self, job_name: &str, limit: u32) -> Result<Vec<Build>, ClientError>;

    /// Full build payload.
    async fn get_build_info(
        &self,
        job_name: &str,
        build_number: u64,
    ) -> Result<JsonValue, ClientError>;

    /// Last `tail_lines` lines of a build's console output.
    async fn get_console_log(
        &self,
        job_name: &str,
        build_number: u64,
        tail_lines: usize,
    ) -> Result<String, ClientError>;

    /// Queue a build. Any HTTP answer is an outcome; see
    /// [`TriggerOutcome::accepted`].
    async fn trigger_build(
        &self,
        job_name: &str,
        parameters: &HashMap<String, String>,
    ) -> Result<TriggerOutcome, ClientError>;

    /// Pending queue items, passed through unmodified.
    async fn list_queue(&self) -> Result<Vec<JsonValue>, ClientError>;
}

#[derive(Debug, Deserialize)]
struct JobsEnvelope {
    #[serde(default)]
    jobs: Vec<Job>,
}

#[derive(Debug, Deserialize)]
struct BuildsEnvelope {
    #[serde(default)]
    builds: Vec<Build>,
}

#[derive(Debug, Deserialize)]
struct QueueEnvelope {
    #[serde(default)]
    items: Vec<JsonValue>,
}

/// Build the value of a Basic `Authorization` header.
///
/// # Examples
///
/// ```
/// use jenkins_mcp::jenkins::basic_auth_value;
///
/// assert_eq!(basic_auth_value("bot", "secret"), "Basic Ym90OnNlY3JldA==");
/// ```
pub fn basic_auth_value(username: &str, api_token: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", username, api_token))
    )
}

/// Keep the last `count` lines of `text`.
///
/// A single trailing newline terminates the last line rather than starting
/// an empty one. `count == 0` returns the text unchanged.
///
/// # Examples
///
/// ```
/// use jenkins_mcp::jenkins::tail_lines;
///
/// assert_eq!(tail_lines("a\nb\nc\n", 2), "b\nc");
/// assert_eq!(tail_lines("a\nb", 5), "a\nb");
/// ```
pub fn tail_lines(text: &str, count: usize) -> String {
    if count == 0 {
        return text.to_string();
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    let lines: Vec<&str> = body.split('\n').collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

/// HTTP client for a single Jenkins server.
///
/// Authentication, timeouts and the TLS policy are fixed at construction.
#[derive(Debug, Clone)]
pub struct JenkinsClient {
    client: Client,
    base: Url,
    base_url: String,
}

impl JenkinsClient {
    /// Creates a new Jenkins client.
    ///
    /// # Arguments
    ///
    /// * `config` - Connection settings
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidConfig` if the URL, user name or token is
    /// empty, the URL does not parse, or the HTTP client cannot be built.
    pub fn new(config: &JenkinsConfig) -> Result<Self, ClientError> {
        if config.url.trim().is_empty() {
            return Err(ClientError::InvalidConfig("Jenkins URL is empty".into()));
        }
        if config.username.trim().is_empty() {
            return Err(ClientError::InvalidConfig("user name is empty".into()));
        }
        if config.api_token.trim().is_empty() {
            return Err(ClientError::InvalidConfig("API token is empty".into()));
        }

        let base_url = config.url.trim().trim_end_matches('/').to_string();
        let base = Url::parse(&base_url).map_err(|e| {
            ClientError::InvalidConfig(format!("invalid Jenkins URL {}: {}", base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidConfig(format!(
                "Jenkins URL {} cannot carry a path",
                base_url
            )));
        }

        let mut auth = HeaderValue::from_str(&basic_auth_value(&config.username, &config.api_token))
            .map_err(|e| ClientError::InvalidConfig(format!("invalid credentials: {}", e)))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        if config.insecure_skip_tls_verify {
            warn!(
                url = %base_url,
                "TLS certificate verification is disabled for Jenkins; only use this on a trusted network"
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .danger_accept_invalid_certs(config.insecure_skip_tls_verify)
            .user_agent(concat!("jenkins-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ClientError::InvalidConfig(format!("Failed to create HTTP client: {}", e))
            })?;

        info!(
            url = %base_url,
            username = %config.username,
            timeout_secs = config.timeout_seconds,
            connect_timeout_secs = config.connect_timeout_seconds,
            "Initialized Jenkins client"
        );

        Ok(Self {
            client,
            base,
            base_url,
        })
    }

    /// The configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL below the server root, e.g. `["queue", "api", "json"]`.
    fn root_url(&self, tail: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(tail);
        }
        url
    }

    /// URL below a job. `a/b` addresses job `b` inside folder `a`.
    fn job_url(&self, job_name: &str, tail: &[&str]) -> Result<Url, ClientError> {
        let parts: Vec<&str> = job_name.split('/').filter(|p| !p.is_empty()).collect();
        if parts.is_empty() {
            return Err(ClientError::InvalidJobName(job_name.to_string()));
        }

        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            for part in parts {
                segments.push("job").push(part);
            }
            segments.extend(tail);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "Jenkins request");
        self.client.request(method, url)
    }

    /// Send a request and turn any non-2xx status into an error.
    async fn send(&self, builder: RequestBuilder, context: &str) -> Result<Response, ClientError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(context, e))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            warn!(status = status.as_u16(), context, "Jenkins returned an error status");
            Err(ClientError::from_status(context, status))
        }
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        context: &str,
    ) -> Result<T, ClientError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::from_reqwest(context, e))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        context: &str,
    ) -> Result<T, ClientError> {
        let response = self
            .send(self.request(Method::GET, url).query(query), context)
            .await?;
        Self::decode(response, context).await
    }
}

#[async_trait]
impl JenkinsApi for JenkinsClient {
    async fn test_connection(&self) -> Result<ServerInfo, ClientError> {
        let context = "server info";
        let response = self
            .send(
                self.request(Method::GET, self.root_url(&["api", "json"])),
                context,
            )
            .await?;

        let header_version = response
            .headers()
            .get("x-jenkins")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let raw: JsonValue = Self::decode(response, context).await?;
        let version = raw
            .get("version")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .or(header_version);

        info!(version = ?version, url = %self.base_url, "Connected to Jenkins");
        Ok(ServerInfo {
            version,
            url: self.base_url.clone(),
            raw,
        })
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, ClientError> {
        let envelope: JobsEnvelope = self
            .get_json(
                self.root_url(&["api", "json"]),
                &[("tree", JOBS_TREE.to_string())],
                "job list",
            )
            .await?;
        debug!(count = envelope.jobs.len(), "Fetched Jenkins jobs");
        Ok(envelope.jobs)
    }

    async fn get_job_info(&self, job_name: &str) -> Result<JsonValue, ClientError> {
        let url = self.job_url(job_name, &["api", "json"])?;
        self.get_json(url, &[], &format!("job '{}'", job_name))
            .await
    }

    async fn list_builds(&self, job_name: &str, limit: u32) -> Result<Vec<Build>, ClientError> {
        let url = self.job_url(job_name, &["api", "json"])?;
        let tree = format!("{}{{0,{}}}", BUILDS_TREE, limit);
        let envelope: BuildsEnvelope = self
            .get_json(url, &[("tree", tree)], &format!("builds of job '{}'", job_name))
            .await?;
        debug!(job = job_name, count = envelope.builds.len(), "Fetched Jenkins builds");
        Ok(envelope.builds)
    }

    async fn get_build_info(
        &self,
        job_name: &str,
        build_number: u64,
    ) -> Result<JsonValue, ClientError> {
        let number = build_number.to_string();
        let url = self.job_url(job_name, &[number.as_str(), "api", "json"])?;
        self.get_json(url, &[], &format!("job '{}' build #{}", job_name, build_number))
            .await
    }

    async fn get_console_log(
        &self,
        job_name: &str,
        build_number: u64,
        tail: usize,
    ) -> Result<String, ClientError> {
        let context = format!("console of job '{}' build #{}", job_name, build_number);
        let number = build_number.to_string();
        let url = self.job_url(job_name, &[number.as_str(), "consoleText"])?;
        let response = self.send(self.request(Method::GET, url), &context).await?;
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(&context, e))?;
        Ok(tail_lines(&text, tail))
    }

    async fn trigger_build(
        &self,
        job_name: &str,
        parameters: &HashMap<String, String>,
    ) -> Result<TriggerOutcome, ClientError> {
        let context = format!("trigger job '{}'", job_name);
        let builder = if parameters.is_empty() {
            let url = self.job_url(job_name, &["build"])?;
            self.request(Method::POST, url)
        } else {
            let url = self.job_url(job_name, &["buildWithParameters"])?;
            self.request(Method::POST, url).form(parameters)
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&context, e))?;

        let outcome = TriggerOutcome {
            status: response.status().as_u16(),
        };
        if outcome.accepted() {
            info!(job = job_name, params = parameters.len(), "Triggered Jenkins build");
        } else {
            warn!(job = job_name, status = outcome.status, "Jenkins refused to trigger build");
        }
        Ok(outcome)
    }

    async fn list_queue(&self) -> Result<Vec<JsonValue>, ClientError> {
        let envelope: QueueEnvelope = self
            .get_json(self.root_url(&["queue", "api", "json"]), &[], "build queue")
            .await?;
        Ok(envelope.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> JenkinsConfig {
        JenkinsConfig {
            url: url.to_string(),
            username: "bot".to_string(),
            api_token: "secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_client_new() {
        let client = JenkinsClient::new(&config("https://ci.example.com/")).unwrap();
        assert_eq!(client.base_url(), "https://ci.example.com");
    }

    #[test]
    fn test_client_new_rejects_empty_values() {
        let mut cfg = config("https://ci.example.com");
        cfg.api_token = String::new();
        assert!(matches!(
            JenkinsClient::new(&cfg),
            Err(ClientError::InvalidConfig(_))
        ));

        let mut cfg = config("https://ci.example.com");
        cfg.username = " ".to_string();
        assert!(matches!(
            JenkinsClient::new(&cfg),
            Err(ClientError::InvalidConfig(_))
        ));

        assert!(matches!(
            JenkinsClient::new(&config("")),
            Err(ClientError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_client_new_rejects_bad_url() {
        assert!(matches!(
            JenkinsClient::new(&config("ci.example.com without scheme")),
            Err(ClientError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_basic_auth_value() {
        assert_eq!(basic_auth_value("bot", "secret"), "Basic Ym90OnNlY3JldA==");
    }

    #[test]
    fn test_root_url() {
        let client = JenkinsClient::new(&config("https://ci.example.com")).unwrap();
        assert_eq!(
            client.root_url(&["queue", "api", "json"]).as_str(),
            "https://ci.example.com/queue/api/json"
        );
    }

    #[test]
    fn test_root_url_with_context_path() {
        let client = JenkinsClient::new(&config("https://example.com/jenkins/")).unwrap();
        assert_eq!(
            client.root_url(&["api", "json"]).as_str(),
            "https://example.com/jenkins/api/json"
        );
    }

    #[test]
    fn test_job_url_simple_and_folder() {
        let client = JenkinsClient::new(&config("https://ci.example.com")).unwrap();
        assert_eq!(
            client.job_url("api-server", &["api", "json"]).unwrap().as_str(),
            "https://ci.example.com/job/api-server/api/json"
        );
        assert_eq!(
            client.job_url("team/app", &["12", "consoleText"]).unwrap().as_str(),
            "https://ci.example.com/job/team/job/app/12/consoleText"
        );
    }

    #[test]
    fn test_job_url_encodes_spaces() {
        let client = JenkinsClient::new(&config("https://ci.example.com")).unwrap();
        assert_eq!(
            client.job_url("nightly build", &["build"]).unwrap().as_str(),
            "https://ci.example.com/job/nightly%20build/build"
        );
    }

    #[test]
    fn test_job_url_rejects_empty_name() {
        let client = JenkinsClient::new(&config("https://ci.example.com")).unwrap();
        assert!(matches!(
            client.job_url("/", &["build"]),
            Err(ClientError::InvalidJobName(_))
        ));
    }

    #[test]
    fn test_tail_lines() {
        let log: Vec<String> = (1..=200).map(|i| format!("line {}", i)).collect();
        let text = log.join("\n");
        let tail = tail_lines(&text, 50);
        let lines: Vec<&str> = tail.split('\n').collect();
        assert_eq!(lines.len(), 50);
        assert_eq!(lines[0], "line 151");
        assert_eq!(lines[49], "line 200");
    }

    #[test]
    fn test_tail_lines_short_and_zero() {
        assert_eq!(tail_lines("only\n", 10), "only");
        assert_eq!(tail_lines("a\nb\n", 0), "a\nb\n");
        assert_eq!(tail_lines("", 3), "");
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = ClientError::from_status("job 'api' build #3", StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "HTTP error 404 (job 'api' build #3)");

        let err = ClientError::from_status("job list", StatusCode::FORBIDDEN);
        assert!(matches!(err, ClientError::Permission { .. }));
        assert!(err.to_string().contains("job list"));
    }
}
