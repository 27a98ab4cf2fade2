//! Page visiting
//!
//! One page's navigate → retry → capture → link-extraction cycle. A page that
//! never loads still has its links extracted from whatever the browser
//! ended up showing, so one broken page does not cut off the pages behind it.

use std::path::PathBuf;

use tracing::{debug, warn};
use url::Url;

use crate::capture::CaptureService;
use crate::core::{CaptureTask, NavigationOutcome, Result};
use crate::crawl::ledger::BadUrlLedger;
use crate::crawl::retry::RetryPolicy;
use crate::render::PageRenderer;

/// What a visit produced
#[derive(Debug, Clone, Default)]
pub struct PageVisit {
    /// Screenshots written for the page
    pub screenshots: Vec<PathBuf>,
    /// In-scope links found on the page
    pub links: Vec<Url>,
}

/// How a discovered link is treated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkVerdict {
    /// Same host and in scope: crawl it
    Follow(Url),
    /// Same host but outside the root path scope
    OutOfScope,
    /// Another host, or no host at all
    OtherHost,
    /// Not a URL
    Invalid,
}

/// Which links a crawl follows
#[derive(Debug, Clone, Default)]
pub struct LinkScope {
    root_path: String,
    require_html_suffix: bool,
}

impl LinkScope {
    pub fn new(root_path: impl Into<String>, require_html_suffix: bool) -> Self {
        Self {
            root_path: root_path.into(),
            require_html_suffix,
        }
    }

    /// Classify `href` as found on `parent`.
    ///
    /// The root path test runs on the raw href, not the resolved URL.
    pub fn classify(&self, parent: &Url, href: &str) -> LinkVerdict {
        let link = match parent.join(href) {
            Ok(link) => link,
            Err(_) => return LinkVerdict::Invalid,
        };

        if link.host_str().is_none()
            || link.host_str() != parent.host_str()
            || link.port_or_known_default() != parent.port_or_known_default()
        {
            return LinkVerdict::OtherHost;
        }

        if !self.root_path.is_empty() && !href.contains(&self.root_path) {
            return LinkVerdict::OutOfScope;
        }

        if self.require_html_suffix && !link.path().contains(".html") {
            return LinkVerdict::OutOfScope;
        }

        LinkVerdict::Follow(link)
    }
}

/// Visits pages through a renderer
#[derive(Debug, Clone)]
pub struct PageVisitor {
    capture: CaptureService,
    retry: RetryPolicy,
    scope: LinkScope,
}

impl PageVisitor {
    pub fn new(capture: CaptureService, retry: RetryPolicy, scope: LinkScope) -> Self {
        Self {
            capture,
            retry,
            scope,
        }
    }

    pub fn scope(&self) -> &LinkScope {
        &self.scope
    }

    /// Visit the task's page, capture it and collect its in-scope links.
    ///
    /// Navigation and capture failures are logged and absorbed. Only a failure
    /// to read the page's links is returned.
    pub async fn visit(
        &self,
        page: &mut dyn PageRenderer,
        task: &CaptureTask,
        bad_urls: &BadUrlLedger,
    ) -> Result<PageVisit> {
        debug!(url = %task.url, "visiting");

        let screenshots = match self.navigate(page, &task.url).await {
            Ok(outcome) if outcome.is_ok() => self.capture(page, task).await,
            Ok(outcome) => {
                warn!(
                    url = %task.url,
                    status = ?outcome.status,
                    retries = self.retry.max_retries(),
                    "page did not load, skipping screenshots"
                );
                Vec::new()
            }
            Err(e) if self.retry.grants_bonus(&e) => {
                warn!(url = %task.url, error = %e, "navigation failed, trying once more");
                match page.goto(&task.url).await {
                    Ok(outcome) if outcome.is_ok() => self.capture(page, task).await,
                    Ok(outcome) => {
                        warn!(url = %task.url, status = ?outcome.status, "page did not load, skipping screenshots");
                        Vec::new()
                    }
                    Err(e) => {
                        warn!(url = %task.url, error = %e, "navigation failed, skipping screenshots");
                        Vec::new()
                    }
                }
            }
            Err(e) => {
                warn!(url = %task.url, error = %e, "navigation failed, skipping screenshots");
                Vec::new()
            }
        };

        let hrefs = page.extract_anchor_hrefs().await?;
        let links = self.follow_links(&task.url, hrefs, bad_urls);

        Ok(PageVisit { screenshots, links })
    }

    async fn navigate(&self, page: &mut dyn PageRenderer, url: &Url) -> Result<NavigationOutcome> {
        let mut outcome = page.goto(url).await?;
        let mut retries = 0;

        while self.retry.should_retry(&outcome, retries) {
            debug!(%url, status = ?outcome.status, attempt = retries + 1, "trying again");
            outcome = page.goto(url).await?;
            retries += 1;
        }

        Ok(outcome)
    }

    async fn capture(&self, page: &mut dyn PageRenderer, task: &CaptureTask) -> Vec<PathBuf> {
        match self
            .capture
            .capture(page, &task.storage_dir, &task.base_filename)
            .await
        {
            Ok(written) => written,
            Err(e) => {
                warn!(url = %task.url, error = %e, "error with screenshot");
                // Reload a page that died mid-capture so its links can still be read
                if self.retry.grants_bonus(&e) {
                    if let Err(e) = page.goto(&task.url).await {
                        debug!(url = %task.url, error = %e, "reload after failed capture failed");
                    }
                }
                Vec::new()
            }
        }
    }

    fn follow_links(&self, parent: &Url, hrefs: Vec<String>, bad_urls: &BadUrlLedger) -> Vec<Url> {
        let mut links = Vec::new();

        for href in hrefs {
            match self.scope.classify(parent, &href) {
                LinkVerdict::Follow(link) => links.push(link),
                LinkVerdict::OutOfScope => bad_urls.record(parent.as_str(), href),
                LinkVerdict::OtherHost | LinkVerdict::Invalid => {}
            }
        }

        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent() -> Url {
        Url::parse("https://example.com/docs/intro.html").unwrap()
    }

    #[test]
    fn test_follows_same_host_in_scope() {
        let scope = LinkScope::new("/docs", false);
        assert_eq!(
            scope.classify(&parent(), "https://example.com/docs/sub/page.html"),
            LinkVerdict::Follow(Url::parse("https://example.com/docs/sub/page.html").unwrap())
        );
    }

    #[test]
    fn test_other_host_is_ignored() {
        let scope = LinkScope::new("/docs", false);
        assert_eq!(scope.classify(&parent(), "https://other.com/x"), LinkVerdict::OtherHost);
        assert_eq!(scope.classify(&parent(), "mailto:a@example.com"), LinkVerdict::OtherHost);
        assert_eq!(
            scope.classify(&parent(), "https://example.com:8443/docs/x.html"),
            LinkVerdict::OtherHost
        );
    }

    #[test]
    fn test_same_host_outside_root_path() {
        let scope = LinkScope::new("/docs", false);
        assert_eq!(
            scope.classify(&parent(), "https://example.com/blog/post.html"),
            LinkVerdict::OutOfScope
        );
    }

    #[test]
    fn test_raw_href_is_checked() {
        // Relative links resolve into scope but do not spell the root path out
        let scope = LinkScope::new("/docs", false);
        assert_eq!(scope.classify(&parent(), "other.html"), LinkVerdict::OutOfScope);
    }

    #[test]
    fn test_empty_root_path_follows_everything_on_host() {
        let scope = LinkScope::new("", false);
        assert!(matches!(
            scope.classify(&parent(), "/anything"),
            LinkVerdict::Follow(_)
        ));
    }

    #[test]
    fn test_strict_html_mode() {
        let scope = LinkScope::new("/docs", true);
        assert_eq!(
            scope.classify(&parent(), "https://example.com/docs/releases/"),
            LinkVerdict::OutOfScope
        );
        assert!(matches!(
            scope.classify(&parent(), "https://example.com/docs/a.html"),
            LinkVerdict::Follow(_)
        ));
    }

    #[test]
    fn test_follow_links_records_bad_urls() {
        let visitor = PageVisitor::new(
            CaptureService::from_config(&Default::default()),
            RetryPolicy::default(),
            LinkScope::new("/docs", false),
        );
        let ledger = BadUrlLedger::new();
        let links = visitor.follow_links(
            &parent(),
            vec![
                "https://example.com/docs/a.html".to_string(),
                "https://other.com/x".to_string(),
                "https://example.com/blog/".to_string(),
            ],
            &ledger,
        );

        assert_eq!(links.len(), 1);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.records()[0].bad_url, "https://example.com/blog/");
        assert_eq!(ledger.records()[0].parent_url, parent().as_str());
    }
}
