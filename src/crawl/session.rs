//! Crawl sessions
//!
//! A session is one crawl of one site variant into one storage directory.
//! It owns the visited registry and bad URL ledger for that crawl; the
//! baseline and current sessions never see each other's state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use url::Url;

use crate::capture::CaptureService;
use crate::core::config::{CaptureConfig, CrawlConfig};
use crate::core::{BadUrlRecord, Config, DifferError, Result};
use crate::crawl::filename::FilenameDeriver;
use crate::crawl::ledger::BadUrlLedger;
use crate::crawl::registry::VisitedRegistry;
use crate::crawl::retry::RetryPolicy;
use crate::crawl::scheduler::{CrawlScheduler, CrawlStats};
use crate::crawl::visitor::{LinkScope, PageVisitor};
use crate::render::BrowserLauncher;

/// Settings a session runs with
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub crawl: CrawlConfig,
    pub capture: CaptureConfig,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            crawl: config.crawl.clone(),
            capture: config.capture.clone(),
        }
    }
}

/// Summary of a finished session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    /// Which side this was ("baseline" or "current")
    pub label: String,
    pub root_url: String,
    pub storage_dir: PathBuf,
    /// Reserved page paths and their expected screenshot filenames
    pub pages: BTreeMap<String, Vec<String>>,
    #[serde(flatten)]
    pub stats: CrawlStats,
    pub bad_urls: Vec<BadUrlRecord>,
}

/// One crawl of one site variant
#[derive(Debug)]
pub struct CrawlSession {
    label: String,
    root_url: Url,
    root_path: String,
    storage_dir: PathBuf,
    options: CrawlConfig,
    deriver: FilenameDeriver,
    visitor: PageVisitor,
    registry: VisitedRegistry,
    bad_urls: BadUrlLedger,
}

impl CrawlSession {
    /// Create a session crawling `root_url` into `storage_dir`
    pub fn new(
        label: impl Into<String>,
        root_url: &str,
        storage_dir: impl Into<PathBuf>,
        options: SessionOptions,
    ) -> Result<Self> {
        let mut root_url = Url::parse(root_url)
            .map_err(|e| DifferError::config(format!("Invalid URL '{}': {}", root_url, e)))?;
        root_url.set_fragment(None);

        if root_url.host_str().is_none() {
            return Err(DifferError::config(format!("URL has no host: {}", root_url)));
        }

        let root_path = options
            .crawl
            .root_path
            .clone()
            .unwrap_or_else(|| root_path_of(&root_url));

        let visitor = PageVisitor::new(
            CaptureService::from_config(&options.capture),
            RetryPolicy::new(options.crawl.max_navigation_retries),
            LinkScope::new(root_path.clone(), options.crawl.require_html_suffix),
        );

        Ok(Self {
            label: label.into(),
            root_url,
            root_path,
            storage_dir: storage_dir.into(),
            options: options.crawl,
            deriver: FilenameDeriver::default(),
            visitor,
            registry: VisitedRegistry::new(),
            bad_urls: BadUrlLedger::new(),
        })
    }

    /// Use a custom filename deriver
    pub fn with_filename_deriver(mut self, deriver: FilenameDeriver) -> Self {
        self.deriver = deriver;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn root_url(&self) -> &Url {
        &self.root_url
    }

    /// Path prefix the crawl is scoped to
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn options(&self) -> &CrawlConfig {
        &self.options
    }

    pub fn filename_deriver(&self) -> &FilenameDeriver {
        &self.deriver
    }

    pub fn visitor(&self) -> &PageVisitor {
        &self.visitor
    }

    pub fn registry(&self) -> &VisitedRegistry {
        &self.registry
    }

    pub fn bad_urls(&self) -> &BadUrlLedger {
        &self.bad_urls
    }

    /// Crawl the site and write its screenshots.
    ///
    /// Fails only if the storage directory or the browser cannot be set up;
    /// page-level failures are counted in the report.
    pub async fn run(self, launcher: Arc<dyn BrowserLauncher>) -> Result<SessionReport> {
        tokio::fs::create_dir_all(&self.storage_dir)
            .await
            .map_err(|e| {
                DifferError::with_context(
                    format!("Failed to create {}", self.storage_dir.display()),
                    e,
                )
            })?;

        launcher.prepare().await?;

        info!(
            session = %self.label,
            url = %self.root_url,
            root_path = %self.root_path,
            dir = %self.storage_dir.display(),
            browser = launcher.name(),
            "crawling"
        );

        let session = Arc::new(self);
        let stats = CrawlScheduler::new(Arc::clone(&session), launcher)?
            .run()
            .await;

        info!(
            session = %session.label,
            pages = session.registry.len(),
            completed = stats.completed,
            failed = stats.failed,
            "crawl finished"
        );
        session.bad_urls.report(&session.label);

        Ok(session.report(stats))
    }

    fn report(&self, stats: CrawlStats) -> SessionReport {
        SessionReport {
            label: self.label.clone(),
            root_url: self.root_url.to_string(),
            storage_dir: self.storage_dir.clone(),
            pages: self.registry.snapshot(),
            stats,
            bad_urls: self.bad_urls.records(),
        }
    }
}

/// The directory part of a URL's path, without its trailing slash.
///
/// `https://example.com/docs/intro.html` and `https://example.com/docs/` both
/// give `/docs`; a site root gives the empty string.
pub fn root_path_of(url: &Url) -> String {
    let path = url.path();
    path[..path.rfind('/').unwrap_or(0)].to_string()
}
