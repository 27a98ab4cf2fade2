//! docs-differ - visual regression between two versions of a website
//!
//! Crawls a baseline and a current build of a site, takes a desktop and a
//! mobile screenshot of every same-origin page, and diffs the two screenshot
//! sets.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **Render**: Page renderer contract with an agent-browser backend
//! - **Capture**: Desktop/mobile screenshots and content scrubbing
//! - **Crawl**: Filename derivation, dedup, page visits and the worker pool
//! - **Diff**: Differ contract, byte-exact differ and diff invocation
//! - **Pipeline**: Run modes tying crawls and the diff together
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docs_differ::{AgentBrowserLauncher, Config, FileDiffer, Pipeline, RunPlan};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load();
//!     let launcher = Arc::new(AgentBrowserLauncher::from_config(&config.browser));
//!     let pipeline = Pipeline::new(config, launcher, Arc::new(FileDiffer::new()));
//!
//!     let plan = RunPlan {
//!         baseline_url: Some("https://example.com/docs/".to_string()),
//!         current_url: Some("http://localhost:1234/docs/".to_string()),
//!         ..Default::default()
//!     };
//!     let report = pipeline.run(&plan).await.unwrap();
//!     println!("{} changed", report.diff.changed.len());
//! }
//! ```

pub mod capture;
pub mod core;
pub mod crawl;
pub mod diff;
pub mod pipeline;
pub mod render;

// Re-export commonly used items
pub use crate::core::{Config, DifferError, Result};
pub use crate::crawl::{CrawlSession, SessionOptions, SessionReport};
pub use crate::diff::{DiffReport, Differ, FileDiffer};
pub use crate::pipeline::{Pipeline, RunPlan, RunReport};
pub use crate::render::{AgentBrowserLauncher, BrowserLauncher, PageRenderer};
