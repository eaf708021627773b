//! Jenkins domain models
//!
//! Plain records for jobs and builds, decoupled from the raw JSON that the
//! Jenkins REST API returns. Deserialization is tolerant: missing fields take
//! defaults and unrecognised status strings are preserved as `Unknown`
//! instead of failing the whole response.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Result string substituted when a build record carries no `result` key.
pub const UNKNOWN_RESULT: &str = "UNKNOWN";

/// Ball color reported by Jenkins for a job.
///
/// The `_anime` variants mean a build is currently running. Any value that
/// is not recognised is kept verbatim in [`JobColor::Unknown`].
///
/// # Examples
///
/// ```
/// use jenkins_mcp::jenkins::JobColor;
///
/// assert_eq!(JobColor::from("red_anime"), JobColor::RedAnime);
/// assert_eq!(JobColor::from("purple"), JobColor::Unknown("purple".to_string()));
/// assert_eq!(JobColor::RedAnime.as_str(), "red_anime");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobColor {
    /// Last build succeeded
    Blue,
    /// Last build succeeded, a build is running
    BlueAnime,
    /// Last build failed
    Red,
    /// Last build failed, a build is running
    RedAnime,
    /// Last build unstable
    Yellow,
    /// Last build unstable, a build is running
    YellowAnime,
    /// Never built or pending
    Grey,
    /// Never built, a build is running
    GreyAnime,
    /// Job is disabled
    Disabled,
    /// Job is disabled, a build is running
    DisabledAnime,
    /// Last build was aborted
    Aborted,
    /// Last build was aborted, a build is running
    AbortedAnime,
    /// Job has not been built
    NotBuilt,
    /// Job has not been built, a build is running
    NotBuiltAnime,
    /// Any color string Jenkins may add in the future (or an empty one)
    Unknown(String),
}

impl JobColor {
    /// Raw Jenkins string for this color.
    pub fn as_str(&self) -> &str {
        match self {
            JobColor::Blue => "blue",
            JobColor::BlueAnime => "blue_anime",
            JobColor::Red => "red",
            JobColor::RedAnime => "red_anime",
            JobColor::Yellow => "yellow",
            JobColor::YellowAnime => "yellow_anime",
            JobColor::Grey => "grey",
            JobColor::GreyAnime => "grey_anime",
            JobColor::Disabled => "disabled",
            JobColor::DisabledAnime => "disabled_anime",
            JobColor::Aborted => "aborted",
            JobColor::AbortedAnime => "aborted_anime",
            JobColor::NotBuilt => "notbuilt",
            JobColor::NotBuiltAnime => "notbuilt_anime",
            JobColor::Unknown(raw) => raw,
        }
    }

    /// True for the two red colors.
    pub fn is_red(&self) -> bool {
        matches!(self, JobColor::Red | JobColor::RedAnime)
    }
}

impl From<&str> for JobColor {
    fn from(s: &str) -> Self {
        match s {
            "blue" => JobColor::Blue,
            "blue_anime" => JobColor::BlueAnime,
            "red" => JobColor::Red,
            "red_anime" => JobColor::RedAnime,
            "yellow" => JobColor::Yellow,
            "yellow_anime" => JobColor::YellowAnime,
            "grey" => JobColor::Grey,
            "grey_anime" => JobColor::GreyAnime,
            "disabled" => JobColor::Disabled,
            "disabled_anime" => JobColor::DisabledAnime,
            "aborted" => JobColor::Aborted,
            "aborted_anime" => JobColor::AbortedAnime,
            "notbuilt" => JobColor::NotBuilt,
            "notbuilt_anime" => JobColor::NotBuiltAnime,
            other => JobColor::Unknown(other.to_string()),
        }
    }
}

impl From<String> for JobColor {
    fn from(s: String) -> Self {
        JobColor::from(s.as_str())
    }
}

impl From<JobColor> for String {
    fn from(color: JobColor) -> Self {
        match color {
            JobColor::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a finished build.
///
/// An in-progress build has no result at all (`Option::None` at the use
/// site); unrecognised strings land in [`BuildResult::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildResult {
    /// Build succeeded
    Success,
    /// Build failed
    Failure,
    /// Build completed with test failures
    Unstable,
    /// Build was aborted
    Aborted,
    /// Build was skipped
    NotBuilt,
    /// Anything else, including the `UNKNOWN` placeholder
    Unknown(String),
}

impl BuildResult {
    /// Raw Jenkins string for this result.
    pub fn as_str(&self) -> &str {
        match self {
            BuildResult::Success => "SUCCESS",
            BuildResult::Failure => "FAILURE",
            BuildResult::Unstable => "UNSTABLE",
            BuildResult::Aborted => "ABORTED",
            BuildResult::NotBuilt => "NOT_BUILT",
            BuildResult::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for BuildResult {
    fn from(s: &str) -> Self {
        match s {
            "SUCCESS" => BuildResult::Success,
            "FAILURE" => BuildResult::Failure,
            "UNSTABLE" => BuildResult::Unstable,
            "ABORTED" => BuildResult::Aborted,
            "NOT_BUILT" => BuildResult::NotBuilt,
            other => BuildResult::Unknown(other.to_string()),
        }
    }
}

impl From<String> for BuildResult {
    fn from(s: String) -> Self {
        BuildResult::from(s.as_str())
    }
}

impl From<BuildResult> for String {
    fn from(result: BuildResult) -> Self {
        match result {
            BuildResult::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the most recent build of a job, as embedded in job listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastBuild {
    /// Build number
    pub number: u64,
    /// Build URL
    pub url: String,
    /// Build result; `None` while the build is running
    pub result: Option<BuildResult>,
    /// Whether the build is running
    pub building: bool,
}

impl LastBuild {
    /// Extract a build reference from a raw `lastBuild` object.
    ///
    /// Returns `None` unless the object carries a numeric `number`, so a
    /// present `LastBuild` always identifies a build.
    pub fn from_value(value: &JsonValue) -> Option<Self> {
        let number = value.get("number")?.as_u64()?;
        Some(Self {
            number,
            url: value
                .get("url")
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string(),
            result: value
                .get("result")
                .and_then(JsonValue::as_str)
                .map(BuildResult::from),
            building: value
                .get("building")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
        })
    }
}

/// Wire shape of a job inside `/api/json?tree=jobs[...]`.
#[derive(Debug, Deserialize)]
struct RawJob {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    buildable: Option<bool>,
    #[serde(rename = "lastBuild", default)]
    last_build: Option<JsonValue>,
}

/// Latest known state of a Jenkins job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawJob")]
pub struct Job {
    /// Job name
    pub name: String,
    /// Job URL
    pub url: String,
    /// Ball color
    pub color: JobColor,
    /// Whether the job can be triggered
    pub buildable: bool,
    /// Most recent build, if any
    pub last_build: Option<LastBuild>,
}

impl From<RawJob> for Job {
    fn from(raw: RawJob) -> Self {
        Self {
            name: raw.name.unwrap_or_default(),
            url: raw.url.unwrap_or_default(),
            color: JobColor::from(raw.color.unwrap_or_default()),
            buildable: raw.buildable.unwrap_or(false),
            last_build: raw.last_build.as_ref().and_then(LastBuild::from_value),
        }
    }
}

impl Job {
    /// Whether this job counts as failed.
    ///
    /// A job is failed when its color is red (running or not), or when its
    /// last build reported `FAILURE`.
    pub fn is_failed(&self) -> bool {
        self.color.is_red()
            || self
                .last_build
                .as_ref()
                .is_some_and(|b| b.result == Some(BuildResult::Failure))
    }
}

fn default_result() -> Option<String> {
    Some(UNKNOWN_RESULT.to_string())
}

/// Wire shape of a build inside `/job/{name}/api/json?tree=builds[...]`.
///
/// A missing `result` key becomes `UNKNOWN`; an explicit `null` stays `None`
/// (the build is still running).
#[derive(Debug, Deserialize)]
struct RawBuild {
    #[serde(default)]
    number: Option<u64>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default = "default_result")]
    result: Option<String>,
    #[serde(default)]
    building: Option<bool>,
    #[serde(default)]
    duration: Option<u64>,
    #[serde(default)]
    timestamp: Option<u64>,
}

/// One execution of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawBuild")]
pub struct Build {
    /// Build number within the job
    pub number: u64,
    /// Build URL
    pub url: String,
    /// Build result; `None` while the build is running
    pub result: Option<BuildResult>,
    /// Whether the build is running
    pub building: bool,
    /// Duration in milliseconds (0 while running)
    pub duration: u64,
    /// Start time in epoch milliseconds
    pub timestamp: u64,
}

impl From<RawBuild> for Build {
    fn from(raw: RawBuild) -> Self {
        Self {
            number: raw.number.unwrap_or(0),
            url: raw.url.unwrap_or_default(),
            result: raw.result.map(BuildResult::from),
            building: raw.building.unwrap_or(false),
            duration: raw.duration.unwrap_or(0),
            timestamp: raw.timestamp.unwrap_or(0),
        }
    }
}

/// Server metadata returned by the connectivity check.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerInfo {
    /// Jenkins version, from the body or the `X-Jenkins` header
    pub version: Option<String>,
    /// Base URL the client is configured with
    pub url: String,
    /// The full `/api/json` payload
    pub raw: JsonValue,
}

/// Jenkins' answer to a build request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerOutcome {
    /// HTTP status of the trigger POST
    pub status: u16,
}

impl TriggerOutcome {
    /// Only 200 and 201 mean the build was queued.
    pub fn accepted(&self) -> bool {
        matches!(self.status, 200 | 201)
    }
}
