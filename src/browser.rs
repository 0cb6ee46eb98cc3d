//! Isolated Chrome instances for capture tasks
//!
//! Every task launches its own browser with a throwaway profile directory and
//! tears it down when the task ends. Nothing is shared between tasks.

use crate::network_idle::{wait_for_idle, NetworkIdleTracker};
use crate::{
    cdp_request_timeout, create_browser_config, viewport_dimensions, BrowserSettings,
    ImageWaitReport, PageDriver, ReadinessSettings, RunConfig, ScreenshotError, ViewportSize,
};
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::{stream, StreamExt};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, warn};
use uuid::Uuid;

type HandlerTask = JoinHandle<Result<(), chromiumoxide::error::CdpError>>;

/// A live browser owning one page, released with [`BrowserSession::close`]
#[async_trait]
pub trait BrowserSession: PageDriver {
    async fn close(&mut self) -> Result<(), ScreenshotError>;
}

/// Creates one isolated browser session per capture task
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(
        &self,
        viewport: ViewportSize,
    ) -> Result<Box<dyn BrowserSession>, ScreenshotError>;
}

const SCROLL_STEP_SCRIPT: &str = r#"(() => {
    const height = document.body.scrollHeight;
    window.scrollBy(0, __STEP__);
    return height;
})()"#;

const SCROLL_TOP_SCRIPT: &str = "(window.scrollTo(0, 0), true)";

const WAIT_FOR_IMAGES_SCRIPT: &str = r#"(async (capMs) => {
    const images = Array.from(document.images);
    const pending = images.filter((img) => !img.complete);
    let timedOut = 0;
    await Promise.all(pending.map((img) => new Promise((resolve) => {
        const timer = setTimeout(() => { timedOut += 1; resolve(); }, capMs);
        const done = () => { clearTimeout(timer); resolve(); };
        img.addEventListener('load', done, { once: true });
        img.addEventListener('error', done, { once: true });
    })));
    return { total: images.length, pending: pending.length, timedOut };
})(__CAP_MS__)"#;

/// Launches headless Chrome through chromiumoxide
pub struct ChromeLauncher {
    settings: BrowserSettings,
    readiness: ReadinessSettings,
    request_timeout: Duration,
}

impl ChromeLauncher {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            settings: config.browser.clone(),
            readiness: config.readiness.clone(),
            request_timeout: cdp_request_timeout(config.navigation_timeout),
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(
        &self,
        viewport: ViewportSize,
    ) -> Result<Box<dyn BrowserSession>, ScreenshotError> {
        let user_data_dir =
            std::env::temp_dir().join(format!("screenshot-batch-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&user_data_dir)
            .await
            .map_err(|e| {
                ScreenshotError::BrowserLaunchFailed(format!("Failed to create profile dir: {e}"))
            })?;

        let config = create_browser_config(
            &self.settings,
            viewport,
            &user_data_dir,
            self.request_timeout,
        )?;
        let (mut browser, mut handler) = match Browser::launch(config).await {
            Ok(launched) => launched,
            Err(e) => {
                remove_profile_dir(&user_data_dir).await;
                return Err(ScreenshotError::BrowserLaunchFailed(e.to_string()));
            }
        };

        // The handler must be polled for any CDP command to make progress.
        let handler_task: HandlerTask = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!("Handler error: {}", e);
                    return Err(e);
                }
            }
            debug!("Handler stream ended");
            Ok(())
        });

        match open_page(&browser, viewport).await {
            Ok(page) => {
                debug!("Launched browser at {} for {}", user_data_dir.display(), viewport);
                Ok(Box::new(ChromeSession {
                    browser: Mutex::new(browser),
                    page,
                    handler: handler_task,
                    user_data_dir,
                    idle_window: self.readiness.network_idle_window,
                    idle_max_inflight: self.readiness.network_idle_max_inflight,
                    closed: false,
                }))
            }
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                remove_profile_dir(&user_data_dir).await;
                Err(e)
            }
        }
    }
}

async fn open_page(browser: &Browser, viewport: ViewportSize) -> Result<Page, ScreenshotError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| ScreenshotError::BrowserLaunchFailed(e.to_string()))?;

    let (width, height) = viewport_dimensions(viewport)?;
    let emulation_params = SetDeviceMetricsOverrideParams::builder()
        .width(width)
        .height(height)
        .device_scale_factor(1.0)
        .mobile(false)
        .build()
        .map_err(ScreenshotError::BrowserLaunchFailed)?;

    page.execute(emulation_params)
        .await
        .map_err(|e| ScreenshotError::BrowserLaunchFailed(e.to_string()))?;

    page.execute(EnableParams::default())
        .await
        .map_err(|e| ScreenshotError::BrowserLaunchFailed(e.to_string()))?;

    Ok(page)
}

async fn remove_profile_dir(path: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(path).await {
        warn!("Failed to remove profile dir {}: {}", path.display(), e);
    }
}

pub struct ChromeSession {
    browser: Mutex<Browser>,
    page: Page,
    handler: HandlerTask,
    user_data_dir: PathBuf,
    idle_window: Duration,
    idle_max_inflight: usize,
    closed: bool,
}

impl ChromeSession {
    async fn evaluate<T: DeserializeOwned + Send>(
        &self,
        expression: String,
    ) -> Result<T, ScreenshotError> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(ScreenshotError::EvaluationFailed)?;

        self.page
            .evaluate_expression(params)
            .await
            .map_err(|e| ScreenshotError::EvaluationFailed(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| ScreenshotError::EvaluationFailed(e.to_string()))
    }
}

#[async_trait]
impl PageDriver for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<(), ScreenshotError> {
        let navigation_error = |e: chromiumoxide::error::CdpError| {
            ScreenshotError::NavigationFailed(format!("{url}: {e}"))
        };

        // Subscribe before navigating so no request event is missed.
        let started = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(navigation_error)?;
        let finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(navigation_error)?;
        let failed = self
            .page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(navigation_error)?;

        self.page.goto(url).await.map_err(navigation_error)?;

        let started = started.map(|event| event.request_id.inner().clone());
        let done = stream::select(
            finished.map(|event| event.request_id.inner().clone()),
            failed.map(|event| event.request_id.inner().clone()),
        );
        let tracker =
            NetworkIdleTracker::new(self.idle_max_inflight, self.idle_window, Instant::now());

        wait_for_idle(started, done, tracker).await;
        debug!("Network idle for {}", url);
        Ok(())
    }

    async fn scroll_by(&self, step: u64) -> Result<u64, ScreenshotError> {
        self.evaluate(SCROLL_STEP_SCRIPT.replace("__STEP__", &step.to_string()))
            .await
    }

    async fn scroll_to_top(&self) -> Result<(), ScreenshotError> {
        self.evaluate::<bool>(SCROLL_TOP_SCRIPT.to_string())
            .await
            .map(|_| ())
    }

    async fn wait_for_images(&self, cap: Duration) -> Result<ImageWaitReport, ScreenshotError> {
        self.evaluate(WAIT_FOR_IMAGES_SCRIPT.replace("__CAP_MS__", &cap.as_millis().to_string()))
            .await
    }

    async fn capture_full_page(&self, path: &Path) -> Result<(), ScreenshotError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();

        self.page
            .save_screenshot(params, path)
            .await
            .map(|_| ())
            .map_err(|e| ScreenshotError::CaptureFailed(e.to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn close(&mut self) -> Result<(), ScreenshotError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut browser = self.browser.lock().await;
        let close_result = browser.close().await;
        if let Err(e) = browser.wait().await {
            warn!("Failed to reap browser process: {}", e);
        }
        drop(browser);

        self.handler.abort();
        remove_profile_dir(&self.user_data_dir).await;

        close_result
            .map(|_| ())
            .map_err(|e| ScreenshotError::BrowserCloseFailed(e.to_string()))
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // Browser's own Drop kills the child process.
        self.handler.abort();
    }
}
