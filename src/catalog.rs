//! Static catalog of MCP resources and tools
//!
//! Both catalogs are plain data tables. Their order and content never change
//! at runtime, so callers (and tests) may compare them by equality. The tool
//! table is also the only source of required-argument sets used by the
//! dispatcher.

use serde_json::{json, Map, Value};

use crate::mcp::types::{McpTool, Resource};

/// MIME type of every resource in the catalog.
pub const RESOURCE_MIME_TYPE: &str = "application/json";

/// All jobs.
pub const JOBS_URI: &str = "jenkins://jobs";
/// Pending queue items.
pub const QUEUE_URI: &str = "jenkins://queue";
/// Jobs whose last build failed.
pub const FAILED_JOBS_URI: &str = "jenkins://failed-jobs";

/// Tool names, as exposed through `tools/list`.
pub mod tool_names {
    pub const GET_JOBS: &str = "get_jobs";
    pub const GET_JOB_INFO: &str = "get_job_info";
    pub const GET_JOB_BUILDS: &str = "get_job_builds";
    pub const GET_BUILD_INFO: &str = "get_build_info";
    pub const GET_BUILD_CONSOLE: &str = "get_build_console";
    pub const TRIGGER_BUILD: &str = "trigger_build";
    pub const GET_FAILED_JOBS: &str = "get_failed_jobs";
    pub const GET_QUEUE: &str = "get_queue";
    pub const TEST_CONNECTION: &str = "test_connection";
}

/// Default for `get_job_builds.limit`.
pub const DEFAULT_BUILD_LIMIT: u64 = 10;

/// Default for `get_build_console.lines`.
pub const DEFAULT_CONSOLE_LINES: u64 = 50;

/// JSON type of a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// JSON string
    String,
    /// Non-negative JSON integer
    Integer,
    /// JSON object of string values
    Object,
}

impl ParamKind {
    fn schema_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Object => "object",
        }
    }
}

/// One argument of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub required: bool,
}

/// One tool entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

/// One resource entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSpec {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

const JOB_NAME: ParamSpec = ParamSpec {
    name: "job_name",
    kind: ParamKind::String,
    description: "Job name; use 'folder/job' for jobs inside folders",
    required: true,
};

const BUILD_NUMBER: ParamSpec = ParamSpec {
    name: "build_number",
    kind: ParamKind::Integer,
    description: "Build number",
    required: true,
};

/// Resources, in listing order.
pub const RESOURCES: &[ResourceSpec] = &[
    ResourceSpec {
        uri: JOBS_URI,
        name: "Jenkins jobs",
        description: "All jobs with their status and last build",
    },
    ResourceSpec {
        uri: QUEUE_URI,
        name: "Build queue",
        description: "Builds waiting in the Jenkins queue",
    },
    ResourceSpec {
        uri: FAILED_JOBS_URI,
        name: "Failed jobs",
        description: "Jobs whose last build failed",
    },
];

/// Tools, in listing order.
pub const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: tool_names::GET_JOBS,
        description: "List all Jenkins jobs",
        params: &[ParamSpec {
            name: "filter",
            kind: ParamKind::String,
            description: "Case-insensitive substring of the job name (optional)",
            required: false,
        }],
    },
    ToolSpec {
        name: tool_names::GET_JOB_INFO,
        description: "Get detailed information about a job",
        params: &[JOB_NAME],
    },
    ToolSpec {
        name: tool_names::GET_JOB_BUILDS,
        description: "List the most recent builds of a job",
        params: &[
            JOB_NAME,
            ParamSpec {
                name: "limit",
                kind: ParamKind::Integer,
                description: "Number of builds to show (default: 10)",
                required: false,
            },
        ],
    },
    ToolSpec {
        name: tool_names::GET_BUILD_INFO,
        description: "Get detailed information about a single build",
        params: &[JOB_NAME, BUILD_NUMBER],
    },
    ToolSpec {
        name: tool_names::GET_BUILD_CONSOLE,
        description: "Get the console log of a build",
        params: &[
            JOB_NAME,
            BUILD_NUMBER,
            ParamSpec {
                name: "lines",
                kind: ParamKind::Integer,
                description: "Number of trailing lines to show (default: 50, 0 for all)",
                required: false,
            },
        ],
    },
    ToolSpec {
        name: tool_names::TRIGGER_BUILD,
        description: "Trigger a build of a job",
        params: &[
            ParamSpec {
                name: "job_name",
                kind: ParamKind::String,
                description: "Name of the job to build",
                required: true,
            },
            ParamSpec {
                name: "parameters",
                kind: ParamKind::Object,
                description: "Build parameters (optional)",
                required: false,
            },
        ],
    },
    ToolSpec {
        name: tool_names::GET_FAILED_JOBS,
        description: "List jobs whose last build failed",
        params: &[],
    },
    ToolSpec {
        name: tool_names::GET_QUEUE,
        description: "Show builds waiting in the queue",
        params: &[],
    },
    ToolSpec {
        name: tool_names::TEST_CONNECTION,
        description: "Test the connection to Jenkins",
        params: &[],
    },
];

impl ToolSpec {
    /// Names of the required arguments, in declaration order.
    pub fn required(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.iter().filter(|p| p.required).map(|p| p.name)
    }

    /// JSON Schema for the tool's arguments.
    ///
    /// `required` is omitted when the tool has no required arguments.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| {
                (
                    p.name.to_string(),
                    json!({
                        "type": p.kind.schema_type(),
                        "description": p.description,
                    }),
                )
            })
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });
        let required: Vec<&str> = self.required().collect();
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }

    /// MCP descriptor for `tools/list`.
    pub fn to_mcp(&self) -> McpTool {
        McpTool {
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
            input_schema: self.input_schema(),
        }
    }
}

impl ResourceSpec {
    /// MCP descriptor for `resources/list`.
    pub fn to_mcp(&self) -> Resource {
        Resource {
            uri: self.uri.to_string(),
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
            mime_type: Some(RESOURCE_MIME_TYPE.to_string()),
        }
    }
}

/// Look up a tool by name.
pub fn find_tool(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|t| t.name == name)
}

/// Look up a resource by URI.
pub fn find_resource(uri: &str) -> Option<&'static ResourceSpec> {
    RESOURCES.iter().find(|r| r.uri == uri)
}

/// All resources as MCP descriptors.
pub fn resources() -> Vec<Resource> {
    RESOURCES.iter().map(ResourceSpec::to_mcp).collect()
}

/// All tools as MCP descriptors.
pub fn tools() -> Vec<McpTool> {
    TOOLS.iter().map(ToolSpec::to_mcp).collect()
}
