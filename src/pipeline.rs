//! Full comparison run
//!
//! Cleans the output directories, crawls the baseline and/or current site,
//! diffs the two screenshot sets and optionally removes the screenshots
//! afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::config::OutputConfig;
use crate::core::{Config, DifferError, Result};
use crate::crawl::{CrawlSession, SessionOptions, SessionReport};
use crate::diff::{DiffInvoker, DiffReport, Differ};
use crate::render::BrowserLauncher;

/// The two site variants being compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Baseline,
    Current,
}

impl Side {
    /// Storage directory of this side
    pub fn dir<'a>(&self, output: &'a OutputConfig) -> &'a Path {
        match self {
            Side::Baseline => output.baseline_dir.as_path(),
            Side::Current => output.current_dir.as_path(),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Baseline => write!(f, "baseline"),
            Side::Current => write!(f, "current"),
        }
    }
}

/// What a run should do
#[derive(Debug, Clone, Default)]
pub struct RunPlan {
    pub baseline_url: Option<String>,
    pub current_url: Option<String>,
    /// Diff existing screenshots without crawling
    pub only_run_diff: bool,
    /// Re-crawl only the baseline, keeping the current screenshots
    pub only_crawl_baseline: bool,
    /// Re-crawl only the current site, keeping the baseline screenshots
    pub only_crawl_current: bool,
    /// Keep existing directories instead of deleting them first
    pub skip_clean: bool,
    /// Delete the baseline and current screenshots after diffing
    pub delete_after: bool,
}

impl RunPlan {
    /// Crawls this plan calls for, in order
    pub fn crawls(&self) -> Result<Vec<(Side, String)>> {
        if self.only_run_diff {
            return Ok(Vec::new());
        }

        if self.only_crawl_baseline && self.only_crawl_current {
            return Err(DifferError::config(
                "only-crawl-baseline and only-crawl-current cannot be combined",
            ));
        }

        let single_side = if self.only_crawl_baseline {
            Some(Side::Baseline)
        } else if self.only_crawl_current {
            Some(Side::Current)
        } else {
            None
        };

        match (&self.baseline_url, &self.current_url, single_side) {
            (Some(baseline), Some(current), None) => Ok(vec![
                (Side::Baseline, baseline.clone()),
                (Side::Current, current.clone()),
            ]),
            (Some(url), None, Some(side)) | (None, Some(url), Some(side)) => {
                Ok(vec![(side, url.clone())])
            }
            (Some(_), Some(_), Some(side)) => Err(DifferError::config(format!(
                "only-crawl-{} takes a single URL",
                side
            ))),
            _ => Err(DifferError::config(
                "a baseline and a current URL are required (or one URL with only-crawl-baseline / only-crawl-current)",
            )),
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub sessions: Vec<SessionReport>,
    pub diff: DiffReport,
}

impl RunReport {
    /// Write the report as pretty JSON
    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

/// Crawl-and-diff driver
pub struct Pipeline {
    config: Config,
    launcher: Arc<dyn BrowserLauncher>,
    differ: Arc<dyn Differ>,
}

impl Pipeline {
    pub fn new(config: Config, launcher: Arc<dyn BrowserLauncher>, differ: Arc<dyn Differ>) -> Self {
        Self {
            config,
            launcher,
            differ,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute `plan`.
    ///
    /// Sessions run one after the other. The diff only starts once every
    /// session has finished writing.
    pub async fn run(&self, plan: &RunPlan) -> Result<RunReport> {
        self.config.validate()?;
        let crawls = plan.crawls()?;
        let output = &self.config.output;

        if !plan.skip_clean {
            for (side, _) in &crawls {
                remove_dir(side.dir(output)).await?;
            }
            remove_dir(&output.diff_dir).await?;
        }

        let mut sessions = Vec::with_capacity(crawls.len());
        for (side, url) in crawls {
            let session = CrawlSession::new(
                side.to_string(),
                &url,
                side.dir(output),
                SessionOptions::from_config(&self.config),
            )?;
            sessions.push(session.run(Arc::clone(&self.launcher)).await?);
        }

        let diff = DiffInvoker::new(Arc::clone(&self.differ), self.config.diff.threshold)
            .invoke(&output.baseline_dir, &output.current_dir, &output.diff_dir)
            .await?;

        if plan.delete_after {
            remove_dir(&output.baseline_dir).await?;
            remove_dir(&output.current_dir).await?;
            info!("deleted baseline and current screenshots");
        }

        Ok(RunReport { sessions, diff })
    }

    /// Where the JSON report of a run is written
    pub fn report_path(&self) -> PathBuf {
        self.config.output.diff_dir.join("report.json")
    }
}

async fn remove_dir(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {
            debug!(dir = %path.display(), "removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DifferError::with_context(
            format!("Failed to remove {}", path.display()),
            e,
        )),
    }
}
