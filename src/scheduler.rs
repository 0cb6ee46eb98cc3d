//! Batch scheduling with staggered launches
//!
//! Tasks are split into consecutive batches of at most `concurrency` tasks.
//! Batches run one after another; tasks inside a batch run concurrently on
//! the current task, the k-th one starting after `k * stagger`.

use crate::{CaptureResult, CaptureTask, RunConfig};
use futures::future::join_all;
use std::future::Future;
use std::ops::Range;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// Index ranges of each batch, in order. Yields `ceil(total / concurrency)` batches.
pub fn plan_batches(total: usize, concurrency: usize) -> Vec<Range<usize>> {
    let concurrency = concurrency.max(1);
    (0..total)
        .step_by(concurrency)
        .map(|start| start..(start + concurrency).min(total))
        .collect()
}

/// Start delay of the task at `position_in_batch`.
pub fn stagger_offset(position_in_batch: usize, stagger: Duration) -> Duration {
    let factor = u32::try_from(position_in_batch).unwrap_or(u32::MAX);
    stagger.saturating_mul(factor)
}

#[derive(Debug, Clone, Copy)]
pub struct BatchScheduler {
    concurrency: usize,
    stagger: Duration,
}

impl BatchScheduler {
    pub fn new(concurrency: usize, stagger: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            stagger,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.concurrency, config.launch_stagger)
    }

    /// Runs `work(position, task)` for every task and returns results in input
    /// order. A batch is fully joined before the next one starts.
    pub async fn run<F, Fut>(&self, tasks: &[CaptureTask], work: F) -> Vec<CaptureResult>
    where
        F: Fn(usize, CaptureTask) -> Fut,
        Fut: Future<Output = CaptureResult>,
    {
        let batches = plan_batches(tasks.len(), self.concurrency);
        let batch_count = batches.len();
        let mut results = Vec::with_capacity(tasks.len());

        for (batch_index, range) in batches.into_iter().enumerate() {
            info!(
                "Starting batch {}/{} with {} task(s)",
                batch_index + 1,
                batch_count,
                range.len()
            );

            let launches = range.enumerate().map(|(position, index)| {
                let offset = stagger_offset(position, self.stagger);
                let capture = work(index, tasks[index].clone());
                async move {
                    if !offset.is_zero() {
                        sleep(offset).await;
                    }
                    capture.await
                }
            });

            results.extend(join_all(launches).await);
        }

        results
    }
}
