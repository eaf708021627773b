//! Human-readable rendering of Jenkins data
//!
//! Everything here is presentation only: symbols, durations and timestamps
//! never feed back into any decision the dispatcher makes.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use chrono::{Local, TimeZone};
use serde_json::Value as JsonValue;

use crate::jenkins::{Build, BuildResult, Job, JobColor, LastBuild, ServerInfo};

/// Prefix of every failure message.
pub const ERROR_PREFIX: &str = "❌ Error: ";

/// Appended to connectivity failures.
pub const VPN_HINT: &str = "💡 Tip: Jenkins could not be reached. Are you connected to the VPN?";

/// Marker for any status without a dedicated symbol.
pub const UNKNOWN_SYMBOL: &str = "❓";

/// Symbol for a job's ball color.
pub fn job_symbol(color: &JobColor) -> &'static str {
    match color {
        JobColor::Blue => "✅",
        JobColor::BlueAnime => "🔄",
        JobColor::Red => "❌",
        JobColor::RedAnime => "🔄❌",
        JobColor::Yellow => "⚠️",
        JobColor::Grey | JobColor::NotBuilt => "⚪",
        JobColor::Disabled => "⏸️",
        JobColor::Aborted => "⏹️",
        _ => UNKNOWN_SYMBOL,
    }
}

/// Symbol for a build result; `None` means the build is running.
pub fn build_symbol(result: Option<&BuildResult>) -> &'static str {
    match result {
        None => "🔄",
        Some(BuildResult::Success) => "✅",
        Some(BuildResult::Failure) => "❌",
        Some(BuildResult::Unstable) => "⚠️",
        Some(BuildResult::Aborted) => "⏹️",
        Some(_) => UNKNOWN_SYMBOL,
    }
}

/// Whole minutes, or `None` for a zero duration.
///
/// # Examples
///
/// ```
/// use jenkins_mcp::format::format_duration;
///
/// assert_eq!(format_duration(185_000), Some("3 min".to_string()));
/// assert_eq!(format_duration(59_999), Some("0 min".to_string()));
/// assert_eq!(format_duration(0), None);
/// ```
pub fn format_duration(ms: u64) -> Option<String> {
    (ms > 0).then(|| format!("{} min", ms / 60_000))
}

/// Local `YYYY-MM-DD HH:MM`, or `None` for a zero timestamp.
pub fn format_timestamp(epoch_ms: u64) -> Option<String> {
    if epoch_ms == 0 {
        return None;
    }
    let ms = i64::try_from(epoch_ms).ok()?;
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn last_result_label(last: &LastBuild) -> String {
    match &last.result {
        Some(result) => result.to_string(),
        None if last.building => "In progress".to_string(),
        None => "N/A".to_string(),
    }
}

fn str_field<'a>(value: &'a JsonValue, key: &str) -> Option<&'a str> {
    value.get(key).and_then(JsonValue::as_str).filter(|s| !s.is_empty())
}

/// Text for `get_jobs`.
pub fn render_jobs(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return "📋 No jobs found".to_string();
    }

    let mut out = format!("📋 **Jenkins jobs:** ({} total)\n\n", jobs.len());
    for job in jobs {
        let _ = writeln!(out, "{} **{}**", job_symbol(&job.color), job.name);
        let _ = writeln!(out, "   📊 Status: {}", job.color);
        let _ = writeln!(out, "   🔧 Buildable: {}", yes_no(job.buildable));
        if let Some(last) = &job.last_build {
            let _ = writeln!(out, "   🔢 Last build: #{}", last.number);
            let _ = writeln!(out, "   📊 Result: {}", last_result_label(last));
        }
        out.push('\n');
    }
    out
}

/// Text for `get_job_info`.
pub fn render_job_info(job_name: &str, info: &JsonValue) -> String {
    let mut out = format!("🔧 **Job: {}**\n\n", job_name);
    let _ = writeln!(
        out,
        "📝 **Description:** {}",
        str_field(info, "description").unwrap_or("No description")
    );
    let _ = writeln!(
        out,
        "📊 **Status:** {}",
        str_field(info, "color").unwrap_or("N/A")
    );
    let _ = writeln!(
        out,
        "🔧 **Buildable:** {}",
        yes_no(info.get("buildable").and_then(JsonValue::as_bool).unwrap_or(false))
    );
    let _ = writeln!(out, "🔗 **URL:** {}\n", str_field(info, "url").unwrap_or("N/A"));

    if let Some(last) = info.get("lastBuild").and_then(LastBuild::from_value) {
        let _ = writeln!(out, "🔢 **Last build:** #{}", last.number);
        let _ = writeln!(out, "📊 **Result:** {}", last_result_label(&last));
    }

    match info.get("nextBuildNumber").and_then(JsonValue::as_u64) {
        Some(next) => {
            let _ = writeln!(out, "⏭️ **Next build:** #{}", next);
        }
        None => out.push_str("⏭️ **Next build:** N/A\n"),
    }
    out
}

/// Text for `get_job_builds`.
pub fn render_builds(job_name: &str, builds: &[Build]) -> String {
    if builds.is_empty() {
        return format!("📋 No builds for job '{}'", job_name);
    }

    let mut out = format!(
        "📋 **Builds of job '{}':** ({} builds)\n\n",
        job_name,
        builds.len()
    );
    for build in builds {
        let _ = writeln!(
            out,
            "{} **Build #{}**",
            build_symbol(build.result.as_ref()),
            build.number
        );
        let result = build
            .result
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "In progress".to_string());
        let _ = writeln!(out, "   📊 Result: {}", result);
        let _ = writeln!(out, "   🔄 Running: {}", yes_no(build.building));
        if let Some(duration) = format_duration(build.duration) {
            let _ = writeln!(out, "   ⏱️ Duration: {}", duration);
        }
        if let Some(date) = format_timestamp(build.timestamp) {
            let _ = writeln!(out, "   📅 Date: {}", date);
        }
        out.push('\n');
    }
    out
}

/// Text for `get_build_info`.
pub fn render_build_info(job_name: &str, build_number: u64, info: &JsonValue) -> String {
    let result = match info.get("result") {
        Some(JsonValue::String(s)) => Some(BuildResult::from(s.as_str())),
        _ => None,
    };
    let building = info
        .get("building")
        .and_then(JsonValue::as_bool)
        .unwrap_or(false);

    let mut out = format!(
        "{} **Build #{} of '{}'**\n\n",
        build_symbol(result.as_ref()),
        build_number,
        job_name
    );
    let _ = writeln!(
        out,
        "📊 **Result:** {}",
        result
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "In progress".to_string())
    );
    let _ = writeln!(out, "🔄 **Running:** {}", yes_no(building));
    if let Some(duration) = info
        .get("duration")
        .and_then(JsonValue::as_u64)
        .and_then(format_duration)
    {
        let _ = writeln!(out, "⏱️ **Duration:** {}", duration);
    }
    if let Some(date) = info
        .get("timestamp")
        .and_then(JsonValue::as_u64)
        .and_then(format_timestamp)
    {
        let _ = writeln!(out, "📅 **Date:** {}", date);
    }
    if let Some(node) = str_field(info, "builtOn") {
        let _ = writeln!(out, "🖥️ **Node:** {}", node);
    }
    if let Some(description) = str_field(info, "description") {
        let _ = writeln!(out, "📝 **Description:** {}", description);
    }
    let _ = writeln!(out, "🔗 **URL:** {}", str_field(info, "url").unwrap_or("N/A"));
    out
}

/// Text for `get_build_console`.
pub fn render_console(job_name: &str, build_number: u64, lines: usize, log: &str) -> String {
    let scope = if lines == 0 {
        "full log".to_string()
    } else {
        format!("last {} lines", lines)
    };
    format!(
        "📝 **Console log - {} #{}** ({})\n\n```\n{}\n```",
        job_name, build_number, scope, log
    )
}

/// Text for a build request that Jenkins accepted.
pub fn render_triggered(job_name: &str, parameters: &HashMap<String, String>) -> String {
    if parameters.is_empty() {
        return format!("🚀 Build triggered for '{}'", job_name);
    }
    let sorted: BTreeMap<&String, &String> = parameters.iter().collect();
    let params = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ");
    format!("🚀 Build triggered for '{}' with parameters: {}", job_name, params)
}

/// Error text for a build request Jenkins answered with anything but 200/201.
pub fn render_trigger_rejected(job_name: &str, status: u16) -> String {
    let reason = match status {
        401 => ": check the username and API token",
        403 => ": the user lacks the Build permission on this job",
        404 => ": no such job",
        _ => "",
    };
    render_error(
        &format!(
            "Jenkins did not accept the build request for '{}' (HTTP {}){}",
            job_name, status, reason
        ),
        false,
    )
}

/// Text for `get_failed_jobs`.
pub fn render_failed_jobs(jobs: &[&Job]) -> String {
    if jobs.is_empty() {
        return "✅ No failed jobs right now".to_string();
    }

    let mut out = format!("❌ **Failed jobs:** ({} jobs)\n\n", jobs.len());
    for job in jobs {
        let _ = writeln!(out, "❌ **{}**", job.name);
        let _ = writeln!(out, "   📊 Status: {}", job.color);
        if let Some(last) = &job.last_build {
            let _ = writeln!(out, "   🔢 Build: #{}", last.number);
            let _ = writeln!(out, "   📊 Result: {}", last_result_label(last));
        }
        out.push('\n');
    }
    out
}

/// Text for `get_queue`.
pub fn render_queue(items: &[JsonValue]) -> String {
    if items.is_empty() {
        return "📭 The build queue is empty".to_string();
    }

    let mut out = format!("⏳ **Build queue:** ({} items)\n\n", items.len());
    for item in items {
        let name = item
            .get("task")
            .and_then(|t| str_field(t, "name"))
            .unwrap_or("unknown job");
        let stuck = item.get("stuck").and_then(JsonValue::as_bool).unwrap_or(false);
        let _ = writeln!(out, "{} **{}**", if stuck { "⚠️" } else { "⏳" }, name);
        if let Some(id) = item.get("id").and_then(JsonValue::as_u64) {
            let _ = writeln!(out, "   🆔 Queue id: {}", id);
        }
        if let Some(why) = str_field(item, "why") {
            let _ = writeln!(out, "   💬 Reason: {}", why);
        }
        if let Some(since) = item
            .get("inQueueSince")
            .and_then(JsonValue::as_u64)
            .and_then(format_timestamp)
        {
            let _ = writeln!(out, "   📅 Queued since: {}", since);
        }
        out.push('\n');
    }
    out
}

/// Text for `test_connection`.
pub fn render_connection(info: &ServerInfo) -> String {
    format!(
        "✅ Connected to Jenkins\n🏷️ Version: {}\n🔗 URL: {}",
        info.version.as_deref().unwrap_or("N/A"),
        info.url
    )
}

/// Failure text shown to the user.
///
/// # Examples
///
/// ```
/// use jenkins_mcp::format::render_error;
///
/// assert_eq!(render_error("boom", false), "❌ Error: boom");
/// assert!(render_error("timed out", true).contains("VPN"));
/// ```
pub fn render_error(message: &str, connectivity: bool) -> String {
    if connectivity {
        format!("{}{}\n{}", ERROR_PREFIX, message, VPN_HINT)
    } else {
        format!("{}{}", ERROR_PREFIX, message)
    }
}
