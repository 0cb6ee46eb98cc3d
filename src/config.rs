//! Run configuration with serde serialization/deserialization
//!
//! This module holds the viewport size parser, the immutable run configuration
//! passed into every component, and the Chrome launch settings.

use crate::ScreenshotError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Browser viewport dimensions used for layout before a full-page capture
///
/// Parsed from `WIDTHxHEIGHT` strings. Magnitude is not bounded here; the
/// browser rejects values it cannot honor when the viewport is applied.
///
/// # Examples
///
/// ```rust
/// use screenshot_batch::ViewportSize;
///
/// let size: ViewportSize = "1280x720".parse().unwrap();
/// assert_eq!((size.width, size.height), (1280, 720));
/// assert!("1280X720".parse::<ViewportSize>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ViewportSize {
    pub width: u64,
    pub height: u64,
}

impl ViewportSize {
    pub const fn new(width: u64, height: u64) -> Self {
        Self { width, height }
    }

    /// Parses `<digits>x<digits>` with a case-sensitive literal `x`.
    pub fn parse(input: &str) -> Result<Self, ScreenshotError> {
        let invalid = || ScreenshotError::InvalidSizeFormat(input.to_string());

        let (width, height) = input.split_once('x').ok_or_else(invalid)?;
        if !is_digit_run(width) || !is_digit_run(height) {
            return Err(invalid());
        }

        Ok(Self {
            width: parse_digits(width),
            height: parse_digits(height),
        })
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self::new(1440, 1080)
    }
}

impl FromStr for ViewportSize {
    type Err = ScreenshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ViewportSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn is_digit_run(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

// Digit runs past u64::MAX saturate instead of failing.
fn parse_digits(s: &str) -> u64 {
    s.parse().unwrap_or(u64::MAX)
}

/// Parses every `--size` occurrence independently, falling back to the
/// default 1440x1080 when none were given.
pub fn parse_sizes<S: AsRef<str>>(raw: &[S]) -> Result<Vec<ViewportSize>, ScreenshotError> {
    if raw.is_empty() {
        return Ok(vec![ViewportSize::default()]);
    }

    raw.iter().map(|s| ViewportSize::parse(s.as_ref())).collect()
}

/// Immutable configuration for one batch run
///
/// Built once from defaults, an optional JSON file and CLI flags, then shared
/// read-only with the scheduler and every capture worker.
///
/// # Examples
///
/// ```rust
/// use screenshot_batch::RunConfig;
/// use std::time::Duration;
///
/// let config = RunConfig {
///     concurrency: 2,
///     navigation_timeout: Duration::from_secs(10),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory receiving one PNG per task (default: ./screenshots)
    pub output_dir: PathBuf,

    /// Maximum number of tasks per batch (default: 8)
    pub concurrency: usize,

    /// Upper bound on navigation plus network idle (default: 30 seconds)
    ///
    /// Readiness and capture phases are not covered by this timeout.
    pub navigation_timeout: Duration,

    /// Delay between launches inside a batch (default: 1 second)
    ///
    /// The k-th task of a batch starts after `k * launch_stagger`.
    pub launch_stagger: Duration,

    /// Optional hard limit on navigation, readiness and capture of one task,
    /// measured after the browser is up (default: none)
    pub task_deadline: Option<Duration>,

    /// Page readiness heuristics
    pub readiness: ReadinessSettings,

    /// Chrome launch settings
    pub browser: BrowserSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./screenshots"),
            concurrency: 8,
            navigation_timeout: Duration::from_secs(30),
            launch_stagger: Duration::from_millis(1000),
            task_deadline: None,
            readiness: ReadinessSettings::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl RunConfig {
    /// Loads a JSON configuration file; missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ScreenshotError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScreenshotError::ConfigurationError(format!("{}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn validate(&self) -> Result<(), ScreenshotError> {
        if self.concurrency == 0 {
            return Err(ScreenshotError::ConfigurationError(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        if self.navigation_timeout.is_zero() {
            return Err(ScreenshotError::ConfigurationError(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if self.readiness.scroll_step == 0 {
            return Err(ScreenshotError::ConfigurationError(
                "Scroll step must be greater than 0".to_string(),
            ));
        }

        if matches!(self.task_deadline, Some(d) if d.is_zero()) {
            return Err(ScreenshotError::ConfigurationError(
                "Task deadline must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}

/// Timing and thresholds used to bring a page into a capturable state
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadinessSettings {
    /// Logical pixels scrolled per step (default: 100)
    pub scroll_step: u64,

    /// Cadence of scroll steps (default: 100ms)
    pub scroll_interval: Duration,

    /// Pause after scrolling back to the top (default: 500ms)
    pub scroll_settle: Duration,

    /// Per-image cap on waiting for load or error (default: 5 seconds)
    pub image_wait_cap: Duration,

    /// Pause right before capture (default: 1 second)
    pub final_settle: Duration,

    /// Quiet window for the network idle heuristic (default: 500ms)
    pub network_idle_window: Duration,

    /// Requests allowed in flight while still counting as idle (default: 2)
    pub network_idle_max_inflight: usize,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            scroll_step: 100,
            scroll_interval: Duration::from_millis(100),
            scroll_settle: Duration::from_millis(500),
            image_wait_cap: Duration::from_secs(5),
            final_settle: Duration::from_secs(1),
            network_idle_window: Duration::from_millis(500),
            network_idle_max_inflight: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Path to Chrome/Chromium executable (default: auto-detect)
    pub chrome_path: Option<String>,

    /// Run without a visible window (default: true)
    pub headless: bool,

    /// Extra command-line switches appended after the built-in ones
    pub extra_args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            extra_args: Vec::new(),
        }
    }
}

/// Generate Chrome command-line arguments for one isolated capture browser
///
/// # Examples
///
/// ```rust
/// use screenshot_batch::{get_chrome_args, BrowserSettings, ViewportSize};
///
/// let args = get_chrome_args(&BrowserSettings::default(), ViewportSize::new(800, 600));
/// assert!(args.contains(&"--window-size=800,600".to_string()));
/// ```
pub fn get_chrome_args(settings: &BrowserSettings, viewport: ViewportSize) -> Vec<String> {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-background-timer-throttling".to_string(),
        "--disable-backgrounding-occluded-windows".to_string(),
        "--disable-renderer-backgrounding".to_string(),
        "--disable-features=TranslateUI".to_string(),
        "--disable-extensions".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
        "--hide-scrollbars".to_string(),
        format!("--window-size={},{}", viewport.width, viewport.height),
    ];

    args.extend(settings.extra_args.iter().cloned());
    args
}

/// chromiumoxide's limit on a single CDP command when none is configured.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Limit on a single CDP command for a run.
///
/// Navigation and full-page capture are each one command, so the limit sits
/// above the navigation timeout and that timeout fires first.
pub fn cdp_request_timeout(navigation_timeout: Duration) -> Duration {
    navigation_timeout
        .saturating_add(Duration::from_secs(5))
        .max(DEFAULT_REQUEST_TIMEOUT)
}

pub fn create_browser_config(
    settings: &BrowserSettings,
    viewport: ViewportSize,
    user_data_dir: &Path,
    request_timeout: Duration,
) -> Result<chromiumoxide::browser::BrowserConfig, ScreenshotError> {
    use chromiumoxide::browser::BrowserConfig;

    let (width, height) = viewport_dimensions(viewport)?;

    let mut builder = BrowserConfig::builder()
        .window_size(width, height)
        .user_data_dir(user_data_dir)
        .request_timeout(request_timeout)
        .args(get_chrome_args(settings, viewport));

    if !settings.headless {
        builder = builder.with_head();
    }

    if let Some(chrome_path) = &settings.chrome_path {
        builder = builder.chrome_executable(chrome_path);
    }

    builder.build().map_err(ScreenshotError::BrowserLaunchFailed)
}

/// Narrows a parsed size to what the browser accepts.
pub fn viewport_dimensions(viewport: ViewportSize) -> Result<(u32, u32), ScreenshotError> {
    let narrow = |value: u64| {
        u32::try_from(value).map_err(|_| {
            ScreenshotError::BrowserLaunchFailed(format!(
                "viewport {viewport} exceeds the supported range"
            ))
        })
    };

    Ok((narrow(viewport.width)?, narrow(viewport.height)?))
}
