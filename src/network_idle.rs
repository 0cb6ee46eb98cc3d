//! Network idle heuristic for navigation completion
//!
//! Navigation counts as settled once no more than `max_inflight` requests have
//! been active for a full quiet window.

use futures::{Stream, StreamExt};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

#[derive(Debug)]
pub struct NetworkIdleTracker {
    inflight: HashSet<String>,
    finished: HashSet<String>,
    max_inflight: usize,
    quiet_window: Duration,
    idle_since: Option<Instant>,
}

impl NetworkIdleTracker {
    pub fn new(max_inflight: usize, quiet_window: Duration, now: Instant) -> Self {
        Self {
            inflight: HashSet::new(),
            finished: HashSet::new(),
            max_inflight,
            quiet_window,
            idle_since: Some(now),
        }
    }

    /// Redirects reuse the request id, so a repeat start is not double counted.
    /// A start for an id that already finished is ignored; events buffered
    /// during navigation can be read out of order.
    pub fn request_started(&mut self, request_id: impl Into<String>, now: Instant) {
        let request_id = request_id.into();
        if !self.finished.contains(&request_id) {
            self.inflight.insert(request_id);
        }
        self.refresh(now);
    }

    /// Called for both finished and failed requests.
    pub fn request_done(&mut self, request_id: &str, now: Instant) {
        self.inflight.remove(request_id);
        self.finished.insert(request_id.to_string());
        self.refresh(now);
    }

    pub fn inflight(&self) -> usize {
        self.inflight.len()
    }

    /// Instant at which the network becomes idle if nothing else starts.
    pub fn idle_deadline(&self) -> Option<Instant> {
        self.idle_since.map(|since| since + self.quiet_window)
    }

    pub fn is_idle(&self, now: Instant) -> bool {
        self.idle_deadline().is_some_and(|deadline| now >= deadline)
    }

    fn refresh(&mut self, now: Instant) {
        if self.inflight.len() > self.max_inflight {
            self.idle_since = None;
        } else if self.idle_since.is_none() {
            self.idle_since = Some(now);
        }
    }
}

/// Feeds request ids into `tracker` until the network has been idle for the
/// quiet window.
///
/// `done` carries both finished and failed requests. The wait itself is
/// unbounded; callers apply the navigation timeout.
pub async fn wait_for_idle<S, D>(started: S, done: D, mut tracker: NetworkIdleTracker)
where
    S: Stream<Item = String>,
    D: Stream<Item = String>,
{
    let started = started.fuse();
    let done = done.fuse();
    futures::pin_mut!(started, done);

    loop {
        let deadline = tracker.idle_deadline();
        let quiet = async move {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            Some(request_id) = started.next() => {
                tracker.request_started(request_id, Instant::now());
            }
            Some(request_id) = done.next() => {
                tracker.request_done(&request_id, Instant::now());
            }
            _ = quiet => {
                if tracker.is_idle(Instant::now()) {
                    return;
                }
            }
        }
    }
}
