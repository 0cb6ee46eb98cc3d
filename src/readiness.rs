//! Page readiness before a full-page capture
//!
//! A page moves through `Navigating -> Scrolling -> WaitingImages -> Settling
//! -> Captured`. Any error moves it to `Failed`, which is terminal. The scroll
//! phase steps down the document to trigger lazy-loaded content, the image
//! phase waits for pending `<img>` elements, and two fixed settle delays give
//! layout and animations time to finish.

use crate::{ReadinessSettings, ScreenshotError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};
use tracing::debug;

/// Outcome of the in-page image wait
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageWaitReport {
    /// Image elements in the document
    pub total: usize,
    /// Images that were not complete when the wait began
    pub pending: usize,
    /// Pending images that hit the per-image cap
    pub timed_out: usize,
}

/// Browser page operations the readiness controller relies on
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigates and waits for network idle. Callers bound this with a timeout.
    async fn navigate(&self, url: &str) -> Result<(), ScreenshotError>;

    /// Scrolls down by `step` pixels and returns the document height read
    /// before the scroll.
    async fn scroll_by(&self, step: u64) -> Result<u64, ScreenshotError>;

    async fn scroll_to_top(&self) -> Result<(), ScreenshotError>;

    /// Waits for every incomplete image to load or error, each bounded by `cap`.
    async fn wait_for_images(&self, cap: Duration) -> Result<ImageWaitReport, ScreenshotError>;

    /// Writes a full-page PNG to `path`.
    async fn capture_full_page(&self, path: &Path) -> Result<(), ScreenshotError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    Navigating,
    Scrolling,
    WaitingImages,
    Settling,
    Captured,
    Failed,
}

/// Drives one page through navigation, lazy-load scrolling, image waiting and
/// capture.
pub struct ReadinessController<'a, P: PageDriver + ?Sized> {
    page: &'a P,
    settings: &'a ReadinessSettings,
    state: ReadinessState,
    scrolled: u64,
    images: ImageWaitReport,
}

impl<'a, P: PageDriver + ?Sized> ReadinessController<'a, P> {
    pub fn new(page: &'a P, settings: &'a ReadinessSettings) -> Self {
        Self {
            page,
            settings,
            state: ReadinessState::Navigating,
            scrolled: 0,
            images: ImageWaitReport::default(),
        }
    }

    pub fn state(&self) -> ReadinessState {
        self.state
    }

    /// Total distance scrolled during the lazy-load phase.
    pub fn scrolled(&self) -> u64 {
        self.scrolled
    }

    pub fn image_report(&self) -> ImageWaitReport {
        self.images
    }

    /// Runs navigation and every readiness phase, stopping in `Settling`.
    ///
    /// `navigation_timeout` bounds only the navigation step.
    pub async fn prepare(
        &mut self,
        url: &str,
        navigation_timeout: Duration,
    ) -> Result<(), ScreenshotError> {
        let result = self.run_phases(url, navigation_timeout).await;
        self.fail_on_error(result)
    }

    /// Captures the prepared page to `path`.
    pub async fn capture(&mut self, path: &Path) -> Result<(), ScreenshotError> {
        if self.state != ReadinessState::Settling {
            return Err(ScreenshotError::CaptureFailed(format!(
                "page is not ready for capture (state {:?})",
                self.state
            )));
        }

        let result = self.page.capture_full_page(path).await;
        let result = self.fail_on_error(result);
        if result.is_ok() {
            self.transition(ReadinessState::Captured);
        }
        result
    }

    async fn run_phases(
        &mut self,
        url: &str,
        navigation_timeout: Duration,
    ) -> Result<(), ScreenshotError> {
        self.transition(ReadinessState::Navigating);
        match timeout(navigation_timeout, self.page.navigate(url)).await {
            Ok(result) => result?,
            Err(_) => return Err(ScreenshotError::NavigationTimeout(navigation_timeout)),
        }

        self.transition(ReadinessState::Scrolling);
        self.scrolled = self.scroll_until_bottom().await?;
        self.page.scroll_to_top().await?;
        sleep(self.settings.scroll_settle).await;

        self.transition(ReadinessState::WaitingImages);
        self.images = self
            .page
            .wait_for_images(self.settings.image_wait_cap)
            .await?;
        debug!(
            "Images: {} total, {} pending, {} timed out",
            self.images.total, self.images.pending, self.images.timed_out
        );

        self.transition(ReadinessState::Settling);
        sleep(self.settings.final_settle).await;

        Ok(())
    }

    /// Steps down on a fixed cadence, re-reading the height each tick so
    /// content appended by lazy loading extends the walk.
    async fn scroll_until_bottom(&self) -> Result<u64, ScreenshotError> {
        let step = self.settings.scroll_step;
        let mut ticker = interval(self.settings.scroll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        let mut scrolled = 0u64;
        loop {
            ticker.tick().await;
            let height = self.page.scroll_by(step).await?;
            scrolled = scrolled.saturating_add(step);
            if scrolled >= height {
                debug!("Scrolled {}px of {}px document", scrolled, height);
                return Ok(scrolled);
            }
        }
    }

    fn fail_on_error<T>(
        &mut self,
        result: Result<T, ScreenshotError>,
    ) -> Result<T, ScreenshotError> {
        if result.is_err() {
            self.transition(ReadinessState::Failed);
        }
        result
    }

    fn transition(&mut self, next: ReadinessState) {
        if self.state != next {
            debug!("Readiness {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}
