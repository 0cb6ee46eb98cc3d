//! Per-task capture: launch, prepare, name, capture, tear down

use crate::{
    capture_detail, naming, BrowserLauncher, CaptureTask, PageDriver, ProgressTracker,
    ReadinessController, RunConfig, ScreenshotError, ViewportSize,
};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Outcome of exactly one capture task
///
/// `file_path` is set iff the capture succeeded, `error` iff it failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureResult {
    pub url: String,
    pub size: ViewportSize,
    pub success: bool,
    pub file_path: Option<PathBuf>,
    pub error: Option<String>,
    pub duration: Duration,
}

impl CaptureResult {
    pub fn succeeded(task: &CaptureTask, file_path: PathBuf, duration: Duration) -> Self {
        Self {
            url: task.url.clone(),
            size: task.size,
            success: true,
            file_path: Some(file_path),
            error: None,
            duration,
        }
    }

    pub fn failed(task: &CaptureTask, error: &ScreenshotError, duration: Duration) -> Self {
        Self {
            url: task.url.clone(),
            size: task.size,
            success: false,
            file_path: None,
            error: Some(error.to_string()),
            duration,
        }
    }
}

/// Captures single tasks, each in its own browser
///
/// Failures are converted into a failed [`CaptureResult`]; nothing a task
/// does can abort its siblings or the run.
pub struct CaptureWorker {
    config: Arc<RunConfig>,
    launcher: Arc<dyn BrowserLauncher>,
    progress: Arc<ProgressTracker>,
}

impl CaptureWorker {
    pub fn new(
        config: Arc<RunConfig>,
        launcher: Arc<dyn BrowserLauncher>,
        progress: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            config,
            launcher,
            progress,
        }
    }

    pub async fn capture(&self, position: usize, task: CaptureTask) -> CaptureResult {
        let total = self.progress.total();
        let start_time = Instant::now();

        println!(
            "[{}/{}] Capturing {} at {}",
            position + 1,
            total,
            task.url,
            task.size
        );

        let outcome = self.run(&task).await;
        let duration = start_time.elapsed();
        let success = outcome.is_ok();
        let completed = self.progress.record_completion(success);

        match outcome {
            Ok(path) => {
                let bytes = tokio::fs::metadata(&path).await.ok().map(|m| m.len());
                println!(
                    "  ✓ [{}/{}] Saved {} {}",
                    completed,
                    total,
                    path.display(),
                    capture_detail(bytes, duration)
                );
                info!("Captured {} at {} in {:?}", task.url, task.size, duration);
                CaptureResult::succeeded(&task, path, duration)
            }
            Err(e) => {
                println!(
                    "  ✗ [{}/{}] Failed {} at {}: {}",
                    completed, total, task.url, task.size, e
                );
                warn!("Capture of {} at {} failed: {}", task.url, task.size, e);
                CaptureResult::failed(&task, &e, duration)
            }
        }
    }

    async fn run(&self, task: &CaptureTask) -> Result<PathBuf, ScreenshotError> {
        let mut session = self.launcher.launch(task.size).await?;

        let work = self.drive(&*session, task);
        let outcome = match self.config.task_deadline {
            Some(deadline) => timeout(deadline, work)
                .await
                .unwrap_or_else(|_| Err(ScreenshotError::TaskDeadlineExceeded(deadline))),
            None => work.await,
        };

        // Released on every path; a failed close does not change the outcome.
        if let Err(e) = session.close().await {
            warn!("Browser teardown for {} failed: {}", task.url, e);
        }

        outcome
    }

    async fn drive<P: PageDriver + ?Sized>(
        &self,
        page: &P,
        task: &CaptureTask,
    ) -> Result<PathBuf, ScreenshotError> {
        let mut controller = ReadinessController::new(page, &self.config.readiness);
        controller
            .prepare(&task.url, self.config.navigation_timeout)
            .await?;

        let path = naming::output_path(
            &self.config.output_dir,
            task,
            self.progress.total(),
            Utc::now(),
        );
        debug!("Writing {} to {}", task.url, path.display());

        controller.capture(&path).await?;
        Ok(path)
    }
}
