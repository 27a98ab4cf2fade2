//! Renderer traits for abstracting browser backends
//!
//! The crawler only ever talks to a browser through these two traits, so any
//! automation backend (agent-browser, CDP, WebDriver, a test fake) can drive it.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::core::{DeviceProfile, NavigationOutcome, Result, Viewport};

/// One browser page, owned by a single crawl task at a time
#[async_trait]
pub trait PageRenderer: Send {
    /// Navigate to a URL and report how the main document loaded
    async fn goto(&mut self, url: &Url) -> Result<NavigationOutcome>;

    /// Resize the viewport
    async fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Emulate a device (viewport, pixel ratio, user agent)
    async fn emulate(&mut self, device: &DeviceProfile) -> Result<()>;

    /// Let late-rendering content settle
    async fn wait(&mut self, delay: Duration) -> Result<()> {
        tokio::time::sleep(delay).await;
        Ok(())
    }

    /// Write a PNG screenshot of the page to `path`
    async fn screenshot(&mut self, path: &Path, full_page: bool) -> Result<()>;

    /// Run a script in the page and return its printed result
    async fn evaluate(&mut self, script: &str) -> Result<String>;

    /// Absolute `href` of every anchor in the rendered DOM
    async fn extract_anchor_hrefs(&mut self) -> Result<Vec<String>>;

    /// Release the page and its browser context
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Hands out pages to crawl workers.
///
/// One launcher can serve several crawl sessions in turn. Each session calls
/// [`prepare`](Self::prepare) before its first page and
/// [`shutdown`](Self::shutdown) after its last one, so a launcher must accept
/// `prepare` again after a `shutdown`.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Check the backend is usable before a session schedules any work
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// Open a fresh page for a task running on `worker`
    async fn new_page(&self, worker: usize) -> Result<Box<dyn PageRenderer>>;

    /// Release what the finished session left open. The launcher stays
    /// usable for the next session.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    /// Get the backend name
    fn name(&self) -> &str;
}
