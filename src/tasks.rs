//! Expansion of input URLs and viewport sizes into capture tasks

use crate::{ScreenshotError, ViewportSize};
use serde::Serialize;

/// One (URL, viewport size) pairing to be captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureTask {
    pub url: String,
    pub url_index: usize,
    pub size: ViewportSize,
    pub size_index: usize,
}

/// Prefixes `https://` unless the input already names an http(s) scheme.
///
/// Hosts are not validated here; a malformed host fails at navigation.
pub fn normalize_url(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    }
}

/// Builds the size-major cross product: every URL for `sizes[0]`, then every
/// URL for `sizes[1]`, and so on.
pub fn expand_tasks<S: AsRef<str>>(
    raw_urls: &[S],
    sizes: &[ViewportSize],
) -> Result<Vec<CaptureTask>, ScreenshotError> {
    if raw_urls.is_empty() {
        return Err(ScreenshotError::NoUrls);
    }

    let urls: Vec<String> = raw_urls.iter().map(|u| normalize_url(u.as_ref())).collect();

    let tasks = sizes
        .iter()
        .enumerate()
        .flat_map(|(size_index, size)| {
            urls.iter().enumerate().map(move |(url_index, url)| CaptureTask {
                url: url.clone(),
                url_index,
                size: *size,
                size_index,
            })
        })
        .collect();

    Ok(tasks)
}
