//! # Screenshot Batch
//!
//! Full-page screenshots of many URLs at many viewport sizes, driven through
//! headless Chrome with bounded, staggered concurrency.
//!
//! ## Pipeline
//!
//! | Stage | Module | Notes |
//! |-------|--------|-------|
//! | Size parsing | [`config`] | `WIDTHxHEIGHT`, default 1440x1080 |
//! | Task expansion | [`tasks`] | URLs x sizes, size-major order |
//! | Batch scheduling | [`scheduler`] | sequential batches, k-th task starts after k seconds |
//! | Capture | [`worker`] | one isolated browser per task |
//! | Page readiness | [`readiness`] | network idle, lazy-load scroll, image wait, settle |
//! | Naming | [`naming`] | `01_02_2024-05-01_10-00-00_1440x1080_example_com.png` |
//! | Summary | [`report`] | `Total | Success | Failed`, non-zero exit on any failure |
//!
//! A failing task never aborts its siblings; it is reported once and the run
//! exits with status 1.
//!
//! ## CLI Usage
//!
//! ```bash
//! screenshot-batch example.com https://www.rust-lang.org -s 1440x1080 -s 390x844 -o shots/
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use screenshot_batch::{
//!     expand_tasks, parse_sizes, BatchScheduler, CaptureWorker, ChromeLauncher,
//!     ProgressTracker, RunConfig, RunReport,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(RunConfig::default());
//!     let sizes = parse_sizes(&["1280x720"])?;
//!     let tasks = expand_tasks(&["example.com"], &sizes)?;
//!
//!     let launcher = Arc::new(ChromeLauncher::new(&config));
//!     let progress = Arc::new(ProgressTracker::new(tasks.len()));
//!     let worker = Arc::new(CaptureWorker::new(config.clone(), launcher, progress));
//!
//!     let results = BatchScheduler::from_config(&config)
//!         .run(&tasks, |position, task| {
//!             let worker = worker.clone();
//!             async move { worker.capture(position, task).await }
//!         })
//!         .await;
//!
//!     println!("{}", RunReport::new(results).summary);
//!     Ok(())
//! }
//! ```

/// Run configuration, viewport size parsing and Chrome launch settings
pub mod config;

/// Error types and error classification
pub mod error;

/// URL normalization and task expansion
pub mod tasks;

/// Output filename synthesis
pub mod naming;

/// Page readiness state machine
pub mod readiness;

/// Network idle detection for navigation
pub mod network_idle;

/// Isolated Chrome sessions
pub mod browser;

/// Per-task capture worker
pub mod worker;

/// Batch scheduling with staggered launches
pub mod scheduler;

/// Result aggregation and progress tracking
pub mod report;

/// Command-line interface implementation
pub mod cli;

/// Utility functions and helpers
pub mod utils;


pub use browser::*;
pub use cli::*;
pub use config::*;
pub use error::*;
pub use readiness::*;
pub use report::*;
pub use scheduler::*;
pub use tasks::*;
pub use utils::*;
pub use worker::*;
