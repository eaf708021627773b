//! Resource and tool dispatch
//!
//! [`Dispatcher`] is the boundary between MCP requests and the Jenkins API.
//! It validates tool arguments against the catalog, calls the client, renders
//! the result, and turns every error into a text payload. Nothing raised
//! below it reaches the protocol loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::catalog::{self, tool_names, ParamKind, ToolSpec};
use crate::error::JenkinsMcpError;
use crate::format;
use crate::jenkins::{JenkinsApi, Job};
use crate::mcp::types::{
    CallToolResponse, ListResourcesResponse, ListToolsResponse, ReadResourceResponse,
    TextResourceContents,
};

type DispatchResult<T> = std::result::Result<T, JenkinsMcpError>;

/// Jobs whose name contains `filter`, ignoring case.
///
/// A blank or absent filter keeps every job; surrounding whitespace is
/// ignored.
///
/// # Examples
///
/// ```
/// use jenkins_mcp::dispatcher::filter_jobs;
/// use jenkins_mcp::jenkins::Job;
///
/// let jobs: Vec<Job> = serde_json::from_value(serde_json::json!([
///     {"name": "nightly-build-1"},
///     {"name": "deploy"}
/// ])).unwrap();
/// let kept = filter_jobs(jobs, Some("Build"));
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].name, "nightly-build-1");
/// ```
pub fn filter_jobs(jobs: Vec<Job>, filter: Option<&str>) -> Vec<Job> {
    match filter.map(|f| f.trim().to_lowercase()).filter(|f| !f.is_empty()) {
        Some(needle) => jobs
            .into_iter()
            .filter(|job| job.name.to_lowercase().contains(&needle))
            .collect(),
        None => jobs,
    }
}

/// Jobs that count as failed, in listing order.
pub fn failed_jobs(jobs: &[Job]) -> Vec<&Job> {
    jobs.iter().filter(|job| job.is_failed()).collect()
}

/// Tool arguments checked against a catalog entry.
struct Arguments {
    values: Map<String, JsonValue>,
}

impl Arguments {
    /// Validate `raw` against `spec`.
    ///
    /// A required argument that is absent, null or an empty string is
    /// missing. Every declared argument that is present must have the
    /// declared type.
    fn parse(spec: &ToolSpec, raw: Option<&JsonValue>) -> DispatchResult<Self> {
        let values = match raw {
            None | Some(JsonValue::Null) => Map::new(),
            Some(JsonValue::Object(map)) => map.clone(),
            Some(_) => {
                return Err(JenkinsMcpError::Validation(
                    "arguments must be a JSON object".to_string(),
                ))
            }
        };
        let args = Self { values };

        let missing: Vec<&str> = spec.required().filter(|name| !args.is_set(name)).collect();
        if !missing.is_empty() {
            let verb = if missing.len() == 1 { "is" } else { "are" };
            return Err(JenkinsMcpError::Validation(format!(
                "{} {} required",
                missing.join(" and "),
                verb
            )));
        }

        for param in spec.params {
            if !args.is_set(param.name) {
                continue;
            }
            match param.kind {
                ParamKind::String => {
                    args.string(param.name)?;
                }
                ParamKind::Integer => {
                    args.integer(param.name)?;
                }
                ParamKind::Object => {
                    args.object(param.name)?;
                }
            }
        }
        Ok(args)
    }

    fn is_set(&self, name: &str) -> bool {
        match self.values.get(name) {
            None | Some(JsonValue::Null) => false,
            Some(JsonValue::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    fn string(&self, name: &str) -> DispatchResult<Option<String>> {
        match self.values.get(name) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(JenkinsMcpError::Validation(format!(
                "{} must be a string, got {}",
                name, other
            ))),
        }
    }

    fn integer(&self, name: &str) -> DispatchResult<Option<u64>> {
        let invalid = |value: &JsonValue| {
            JenkinsMcpError::Validation(format!(
                "{} must be a non-negative integer, got {}",
                name, value
            ))
        };
        match self.values.get(name) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(None),
            Some(value @ JsonValue::Number(n)) => n.as_u64().map(Some).ok_or_else(|| invalid(value)),
            Some(value @ JsonValue::String(s)) => {
                s.trim().parse::<u64>().map(Some).map_err(|_| invalid(value))
            }
            Some(other) => Err(invalid(other)),
        }
    }

    fn object(&self, name: &str) -> DispatchResult<HashMap<String, String>> {
        match self.values.get(name) {
            None | Some(JsonValue::Null) => Ok(HashMap::new()),
            Some(JsonValue::Object(map)) => map
                .iter()
                .map(|(key, value)| {
                    let value = match value {
                        JsonValue::String(s) => s.clone(),
                        JsonValue::Number(n) => n.to_string(),
                        JsonValue::Bool(b) => b.to_string(),
                        other => {
                            return Err(JenkinsMcpError::Validation(format!(
                                "{}.{} must be a string, number or boolean, got {}",
                                name, key, other
                            )))
                        }
                    };
                    Ok((key.clone(), value))
                })
                .collect(),
            Some(other) => Err(JenkinsMcpError::Validation(format!(
                "{} must be an object, got {}",
                name, other
            ))),
        }
    }

    fn required_string(&self, name: &str) -> DispatchResult<String> {
        self.string(name)?
            .ok_or_else(|| JenkinsMcpError::Validation(format!("{} is required", name)))
    }

    fn required_integer(&self, name: &str) -> DispatchResult<u64> {
        self.integer(name)?
            .ok_or_else(|| JenkinsMcpError::Validation(format!("{} is required", name)))
    }
}

/// Routes resource reads and tool calls to the Jenkins API.
pub struct Dispatcher {
    client: Arc<dyn JenkinsApi>,
}

impl Dispatcher {
    /// Create a dispatcher over a shared client.
    pub fn new(client: Arc<dyn JenkinsApi>) -> Self {
        Self { client }
    }

    /// `resources/list`.
    pub fn list_resources(&self) -> ListResourcesResponse {
        ListResourcesResponse {
            resources: catalog::resources(),
        }
    }

    /// `tools/list`.
    pub fn list_tools(&self) -> ListToolsResponse {
        ListToolsResponse {
            tools: catalog::tools(),
        }
    }

    /// `resources/read`.
    ///
    /// Success yields pretty-printed JSON. Failures yield a `text/plain`
    /// item carrying the rendered error.
    pub async fn read_resource(&self, uri: &str) -> ReadResourceResponse {
        let (mime_type, text) = match self.try_read_resource(uri).await {
            Ok(text) => (catalog::RESOURCE_MIME_TYPE, text),
            Err(e) => {
                warn!(uri, error = %e, "Resource read failed");
                (
                    "text/plain",
                    format::render_error(&e.to_string(), e.is_connectivity()),
                )
            }
        };
        ReadResourceResponse {
            contents: vec![TextResourceContents {
                uri: uri.to_string(),
                mime_type: Some(mime_type.to_string()),
                text,
            }],
        }
    }

    /// `tools/call`.
    ///
    /// Never fails; errors come back as a text item with `isError` set.
    pub async fn call_tool(&self, name: &str, arguments: Option<&JsonValue>) -> CallToolResponse {
        let started = Instant::now();
        info!(tool = name, "Calling tool");

        let response = match self.try_call_tool(name, arguments).await {
            Ok(response) => response,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                CallToolResponse::error_text(format::render_error(
                    &e.to_string(),
                    e.is_connectivity(),
                ))
            }
        };

        debug!(
            tool = name,
            is_error = response.is_error(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tool call finished"
        );
        response
    }

    async fn try_read_resource(&self, uri: &str) -> DispatchResult<String> {
        let spec = catalog::find_resource(uri)
            .ok_or_else(|| JenkinsMcpError::NotFound(format!("Unknown resource: {}", uri)))?;

        let text = match spec.uri {
            catalog::JOBS_URI => {
                let jobs = self.client.list_jobs().await?;
                serde_json::to_string_pretty(&jobs)?
            }
            catalog::QUEUE_URI => {
                let items = self.client.list_queue().await?;
                serde_json::to_string_pretty(&items)?
            }
            catalog::FAILED_JOBS_URI => {
                let jobs = self.client.list_jobs().await?;
                let failed: Vec<JsonValue> = failed_jobs(&jobs)
                    .into_iter()
                    .map(|job| {
                        json!({
                            "name": job.name,
                            "color": job.color,
                            "last_build": job.last_build,
                        })
                    })
                    .collect();
                serde_json::to_string_pretty(&failed)?
            }
            other => {
                return Err(JenkinsMcpError::NotFound(format!(
                    "Unknown resource: {}",
                    other
                )))
            }
        };
        Ok(text)
    }

    async fn try_call_tool(
        &self,
        name: &str,
        arguments: Option<&JsonValue>,
    ) -> DispatchResult<CallToolResponse> {
        let spec = catalog::find_tool(name)
            .ok_or_else(|| JenkinsMcpError::NotFound(format!("Unknown tool: {}", name)))?;
        let args = Arguments::parse(spec, arguments)?;

        let text = match spec.name {
            tool_names::TEST_CONNECTION => {
                let info = self.client.test_connection().await?;
                format::render_connection(&info)
            }
            tool_names::GET_JOBS => {
                let filter = args.string("filter")?;
                let jobs = self.client.list_jobs().await?;
                format::render_jobs(&filter_jobs(jobs, filter.as_deref()))
            }
            tool_names::GET_JOB_INFO => {
                let job_name = args.required_string("job_name")?;
                let info = self.client.get_job_info(&job_name).await?;
                format::render_job_info(&job_name, &info)
            }
            tool_names::GET_JOB_BUILDS => {
                let job_name = args.required_string("job_name")?;
                let limit = args.integer("limit")?.unwrap_or(catalog::DEFAULT_BUILD_LIMIT);
                let limit = u32::try_from(limit).map_err(|_| {
                    JenkinsMcpError::Validation(format!("limit {} is too large", limit))
                })?;
                let builds = self.client.list_builds(&job_name, limit).await?;
                format::render_builds(&job_name, &builds)
            }
            tool_names::GET_BUILD_INFO => {
                let job_name = args.required_string("job_name")?;
                let number = args.required_integer("build_number")?;
                let info = self.client.get_build_info(&job_name, number).await?;
                format::render_build_info(&job_name, number, &info)
            }
            tool_names::GET_BUILD_CONSOLE => {
                let job_name = args.required_string("job_name")?;
                let number = args.required_integer("build_number")?;
                let lines = args
                    .integer("lines")?
                    .unwrap_or(catalog::DEFAULT_CONSOLE_LINES);
                let lines = usize::try_from(lines).map_err(|_| {
                    JenkinsMcpError::Validation(format!("lines {} is too large", lines))
                })?;
                let log = self
                    .client
                    .get_console_log(&job_name, number, lines)
                    .await?;
                format::render_console(&job_name, number, lines, &log)
            }
            tool_names::TRIGGER_BUILD => {
                let job_name = args.required_string("job_name")?;
                let parameters = args.object("parameters")?;
                let outcome = self.client.trigger_build(&job_name, &parameters).await?;
                if !outcome.accepted() {
                    return Ok(CallToolResponse::error_text(format::render_trigger_rejected(
                        &job_name,
                        outcome.status,
                    )));
                }
                format::render_triggered(&job_name, &parameters)
            }
            tool_names::GET_FAILED_JOBS => {
                let jobs = self.client.list_jobs().await?;
                format::render_failed_jobs(&failed_jobs(&jobs))
            }
            tool_names::GET_QUEUE => {
                let items = self.client.list_queue().await?;
                format::render_queue(&items)
            }
            other => {
                return Err(JenkinsMcpError::NotFound(format!("Unknown tool: {}", other)));
            }
        };

        Ok(CallToolResponse::text(text))
    }
}
