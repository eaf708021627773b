//! Jenkins REST API access
//!
//! - `models` -- Jobs, builds and their status enums
//! - `client` -- Authenticated HTTP client and the [`JenkinsApi`] seam

pub mod client;
pub mod models;

pub use client::{basic_auth_value, tail_lines, ClientError, JenkinsApi, JenkinsClient};
pub use models::{
    Build, BuildResult, Job, JobColor, LastBuild, ServerInfo, TriggerOutcome,
    UNKNOWN_RESULT,
};

#[cfg(test)]
pub use client::MockJenkinsApi;
