//! Output filename synthesis
//!
//! Names sort by size, then URL, then capture time:
//! `{size#}_{url#}_{timestamp}_{W}x{H}_{host}{path}.png`. Runs with a single
//! task drop the two index prefixes.

use crate::CaptureTask;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use url::Url;

pub const SCREENSHOT_EXTENSION: &str = "png";

/// Formats a capture time as `YYYY-MM-DD_HH-MM-SS` (UTC, sub-seconds dropped).
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Host with every `.` replaced by `_`.
pub fn hostname_component(url: &Url) -> String {
    url.host_str().unwrap_or_default().replace('.', "_")
}

/// Path with every `/` replaced by `_` and leading/trailing `_` runs removed.
pub fn pathname_component(url: &Url) -> String {
    url.path().replace('/', "_").trim_matches('_').to_string()
}

/// Base name (without extension) for one task of a run with `total_tasks` tasks.
pub fn base_name(task: &CaptureTask, total_tasks: usize, timestamp: DateTime<Utc>) -> String {
    let (hostname, pathname) = match Url::parse(&task.url) {
        Ok(url) => (hostname_component(&url), pathname_component(&url)),
        Err(_) => (task.url.replace(['.', '/', ':'], "_"), String::new()),
    };

    let stem = format!(
        "{}_{}_{}{}",
        format_timestamp(timestamp),
        task.size,
        hostname,
        pathname
    );

    if total_tasks > 1 {
        format!("{:02}_{:02}_{}", task.size_index + 1, task.url_index + 1, stem)
    } else {
        stem
    }
}

pub fn file_name(task: &CaptureTask, total_tasks: usize, timestamp: DateTime<Utc>) -> String {
    format!(
        "{}.{}",
        base_name(task, total_tasks, timestamp),
        SCREENSHOT_EXTENSION
    )
}

/// Full write path inside the configured output directory.
pub fn output_path(
    output_dir: &Path,
    task: &CaptureTask,
    total_tasks: usize,
    timestamp: DateTime<Utc>,
) -> PathBuf {
    output_dir.join(file_name(task, total_tasks, timestamp))
}
