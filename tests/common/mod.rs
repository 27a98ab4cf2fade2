//! In-memory site and renderer shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use docs_differ::core::{DeviceProfile, DifferError, NavigationOutcome, Result, Viewport};
use docs_differ::{BrowserLauncher, PageRenderer};
use url::Url;

/// One page of a fake site
#[derive(Debug, Clone)]
pub struct FakePage {
    pub status: u16,
    pub links: Vec<String>,
    pub content: String,
    /// Every navigation to this page fails with this message
    pub goto_error: Option<String>,
    /// Reading links from this page fails
    pub broken_dom: bool,
    /// Every screenshot of this page fails with this message
    pub screenshot_error: Option<String>,
    /// Reading links from this page panics
    pub panics: bool,
}

impl FakePage {
    pub fn new(content: &str, links: &[&str]) -> Self {
        Self {
            status: 200,
            links: links.iter().map(|l| l.to_string()).collect(),
            content: content.to_string(),
            goto_error: None,
            broken_dom: false,
            screenshot_error: None,
            panics: false,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_goto_error(mut self, message: &str) -> Self {
        self.goto_error = Some(message.to_string());
        self
    }

    pub fn with_broken_dom(mut self) -> Self {
        self.broken_dom = true;
        self
    }

    pub fn with_screenshot_error(mut self, message: &str) -> Self {
        self.screenshot_error = Some(message.to_string());
        self
    }

    pub fn with_panic(mut self) -> Self {
        self.panics = true;
        self
    }
}

/// A link graph served to fake pages
#[derive(Debug, Default)]
pub struct FakeSite {
    pages: HashMap<String, FakePage>,
    delay: Duration,
    navigations: Mutex<Vec<String>>,
    open: AtomicUsize,
    max_open: AtomicUsize,
    closed: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// Make every navigation take this long
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn launcher(self) -> Arc<FakeLauncher> {
        Arc::new(FakeLauncher {
            site: Arc::new(self),
        })
    }

    fn lookup(&self, url: &Url) -> Option<&FakePage> {
        let mut url = url.clone();
        url.set_fragment(None);
        self.pages.get(url.as_str())
    }

    /// How many times `url` was navigated to
    pub fn navigations_to(&self, url: &str) -> usize {
        self.navigations
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    pub fn max_open_pages(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    pub fn closed_pages(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

pub struct FakeLauncher {
    pub site: Arc<FakeSite>,
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn new_page(&self, _worker: usize) -> Result<Box<dyn PageRenderer>> {
        let open = self.site.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.site.max_open.fetch_max(open, Ordering::SeqCst);
        Ok(Box::new(FakeRenderer {
            site: Arc::clone(&self.site),
            current: None,
            profile: "desktop".to_string(),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        self.site.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

struct FakeRenderer {
    site: Arc<FakeSite>,
    current: Option<Url>,
    profile: String,
}

impl FakeRenderer {
    fn current_page(&self) -> Option<&FakePage> {
        self.current.as_ref().and_then(|url| self.site.lookup(url))
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn goto(&mut self, url: &Url) -> Result<NavigationOutcome> {
        self.site.navigations.lock().unwrap().push(url.to_string());
        if !self.site.delay.is_zero() {
            tokio::time::sleep(self.site.delay).await;
        }

        self.current = Some(url.clone());
        match self.site.lookup(url) {
            Some(page) => match &page.goto_error {
                Some(message) => Err(DifferError::navigation(url.as_str(), message.clone())),
                None => Ok(NavigationOutcome::with_status(page.status)),
            },
            None => Ok(NavigationOutcome::with_status(404)),
        }
    }

    async fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.profile = format!("{}x{}", viewport.width, viewport.height);
        Ok(())
    }

    async fn emulate(&mut self, device: &DeviceProfile) -> Result<()> {
        self.profile = device.name.clone();
        Ok(())
    }

    async fn wait(&mut self, _delay: Duration) -> Result<()> {
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path, full_page: bool) -> Result<()> {
        let page = self
            .current_page()
            .ok_or_else(|| DifferError::capture("nothing rendered"))?;
        if let Some(message) = &page.screenshot_error {
            return Err(DifferError::capture(message.clone()));
        }
        let content = page.content.clone();
        let bytes = format!("{}|{}|{}", content, self.profile, full_page);
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn evaluate(&mut self, _script: &str) -> Result<String> {
        Ok("true".to_string())
    }

    async fn extract_anchor_hrefs(&mut self) -> Result<Vec<String>> {
        match self.current_page() {
            Some(page) if page.panics => panic!("renderer crashed"),
            Some(page) if page.broken_dom => Err(DifferError::renderer("Execution context was lost")),
            Some(page) => Ok(page.links.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.site.open.fetch_sub(1, Ordering::SeqCst);
        self.site.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
