use crate::{
    expand_tasks, parse_sizes, BatchScheduler, BrowserLauncher, CaptureTask, CaptureWorker,
    ProgressTracker, RunConfig, RunReport, ScreenshotError,
};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "screenshot-batch")]
#[command(about = "Capture full-page screenshots of URLs at one or more viewport sizes")]
#[command(version)]
pub struct Cli {
    /// URLs or bare hostnames (https:// is assumed when no scheme is given)
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    #[arg(short, long, value_name = "DIR", help = "Output directory [default: ./screenshots]")]
    pub output: Option<PathBuf>,

    #[arg(
        short,
        long = "size",
        value_name = "WxH",
        help = "Viewport size, repeatable [default: 1440x1080]"
    )]
    pub sizes: Vec<String>,

    #[arg(short, long, help = "Tasks per batch [default: 8]")]
    pub concurrency: Option<usize>,

    #[arg(
        short,
        long,
        value_name = "SECONDS",
        help = "Navigation timeout per task in seconds [default: 30]"
    )]
    pub timeout: Option<u64>,

    #[arg(long, value_name = "FILE", help = "JSON configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Chrome executable path")]
    pub chrome_path: Option<String>,

    #[arg(long, help = "Print per-task results as JSON after the run")]
    pub json: bool,

    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,
}

/// Validated run: configuration, output directory and task list
///
/// Everything that can fail at startup fails in [`CliRunner::prepare`],
/// before any browser is launched.
#[derive(Debug)]
pub struct CliRunner {
    pub config: Arc<RunConfig>,
    pub tasks: Vec<CaptureTask>,
}

impl CliRunner {
    pub async fn prepare(args: &Cli) -> Result<Self, ScreenshotError> {
        let mut config = load_config(args)?;

        let sizes = parse_sizes(&args.sizes)?;
        let tasks = expand_tasks(&args.urls, &sizes)?;

        config.output_dir = create_output_dir(&config.output_dir).await?;

        info!(
            "Prepared {} task(s): {} URL(s) x {} size(s), concurrency {}, timeout {:?}",
            tasks.len(),
            args.urls.len(),
            sizes.len(),
            config.concurrency,
            config.navigation_timeout
        );

        Ok(Self {
            config: Arc::new(config),
            tasks,
        })
    }

    pub async fn run(&self, launcher: Arc<dyn BrowserLauncher>) -> RunReport {
        let progress = Arc::new(ProgressTracker::new(self.tasks.len()));
        let worker = Arc::new(CaptureWorker::new(
            self.config.clone(),
            launcher,
            progress.clone(),
        ));

        let scheduler = BatchScheduler::from_config(&self.config);
        let results = scheduler
            .run(&self.tasks, |position, task| {
                let worker = worker.clone();
                async move { worker.capture(position, task).await }
            })
            .await;

        let finished = progress.get_progress();
        info!(
            "Run finished in {:?}: {} succeeded, {} failed",
            finished.elapsed, finished.success, finished.errors
        );

        RunReport::new(results)
    }
}

/// Defaults, then the optional JSON file, then CLI flags.
pub fn load_config(args: &Cli) -> Result<RunConfig, ScreenshotError> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }

    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }

    if let Some(timeout) = args.timeout {
        config.navigation_timeout = Duration::from_secs(timeout);
    }

    if let Some(chrome_path) = &args.chrome_path {
        config.browser.chrome_path = Some(chrome_path.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Creates the directory recursively and returns its absolute path.
pub async fn create_output_dir(path: &Path) -> Result<PathBuf, ScreenshotError> {
    let output_error = |e: std::io::Error| ScreenshotError::OutputDirectory {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    fs::create_dir_all(path).await.map_err(output_error)?;
    fs::canonicalize(path).await.map_err(output_error)
}

/// Exit status for a failed argument parse: 0 for `--help` and `--version`,
/// 1 for everything else.
pub fn usage_exit_status(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

pub fn setup_logging(verbose: bool) -> Result<(), ScreenshotError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| ScreenshotError::ConfigurationError(e.to_string()))
}
