//! Screenshot capture
//!
//! Takes the desktop and mobile screenshots of the page a renderer is
//! currently showing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::capture::scrub::SCRUB_SCRIPT;
use crate::core::config::CaptureConfig;
use crate::core::{DeviceProfile, Result, ScreenshotKind, Viewport};
use crate::render::PageRenderer;

/// Desktop + mobile screenshot pair for one page
#[derive(Debug, Clone)]
pub struct CaptureService {
    desktop: bool,
    mobile: bool,
    settle_delay: Duration,
    scrub_content: bool,
    desktop_viewport: Viewport,
    mobile_device: DeviceProfile,
}

impl CaptureService {
    /// Create a capture service from configuration
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            desktop: config.desktop,
            mobile: config.mobile,
            settle_delay: config.settle_delay(),
            scrub_content: config.scrub_content,
            desktop_viewport: Viewport::DESKTOP,
            mobile_device: config.mobile_device.clone(),
        }
    }

    /// Kinds of screenshot this service takes, in order
    pub fn kinds(&self) -> Vec<ScreenshotKind> {
        ScreenshotKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                ScreenshotKind::Desktop => self.desktop,
                ScreenshotKind::Mobile => self.mobile,
            })
            .collect()
    }

    /// Capture the current page into `storage_dir` under `base`.
    ///
    /// Returns the written paths. Stops at the first failing step.
    pub async fn capture(
        &self,
        page: &mut dyn PageRenderer,
        storage_dir: &Path,
        base: &str,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(2);

        for kind in self.kinds() {
            match kind {
                ScreenshotKind::Desktop => page.set_viewport(self.desktop_viewport).await?,
                ScreenshotKind::Mobile => page.emulate(&self.mobile_device).await?,
            }

            // Some of the scrubbed markup is re-rendered per device profile
            self.scrub(page).await?;
            page.wait(self.settle_delay).await?;

            let path = kind.path_in(storage_dir, base);
            page.screenshot(&path, true).await?;
            debug!(path = %path.display(), "screenshot written");
            written.push(path);
        }

        Ok(written)
    }

    async fn scrub(&self, page: &mut dyn PageRenderer) -> Result<()> {
        if self.scrub_content {
            page.evaluate(SCRUB_SCRIPT).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NavigationOutcome;
    use async_trait::async_trait;
    use url::Url;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    #[async_trait]
    impl PageRenderer for Recorder {
        async fn goto(&mut self, _url: &Url) -> Result<NavigationOutcome> {
            Ok(NavigationOutcome::with_status(200))
        }

        async fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
            self.calls.push(format!("viewport {}x{}", viewport.width, viewport.height));
            Ok(())
        }

        async fn emulate(&mut self, device: &DeviceProfile) -> Result<()> {
            self.calls.push(format!("emulate {}", device.name));
            Ok(())
        }

        async fn wait(&mut self, delay: Duration) -> Result<()> {
            self.calls.push(format!("wait {}", delay.as_millis()));
            Ok(())
        }

        async fn screenshot(&mut self, path: &Path, full_page: bool) -> Result<()> {
            assert!(full_page);
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            self.calls.push(format!("screenshot {}", name));
            Ok(())
        }

        async fn evaluate(&mut self, _script: &str) -> Result<String> {
            self.calls.push("scrub".to_string());
            Ok("true".to_string())
        }

        async fn extract_anchor_hrefs(&mut self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_capture_order_with_scrubbing() {
        let config = CaptureConfig {
            scrub_content: true,
            settle_delay_ms: 100,
            ..CaptureConfig::default()
        };
        let service = CaptureService::from_config(&config);
        let mut page = Recorder::default();

        let written = service
            .capture(&mut page, Path::new("out"), "intro")
            .await
            .unwrap();

        assert_eq!(
            written,
            vec![
                Path::new("out").join("intro_desktop.png"),
                Path::new("out").join("intro_mobile.png"),
            ]
        );
        assert_eq!(
            page.calls,
            vec![
                "viewport 1366x784",
                "scrub",
                "wait 100",
                "screenshot intro_desktop.png",
                "emulate iPhone 11",
                "scrub",
                "wait 100",
                "screenshot intro_mobile.png",
            ]
        );
    }

    #[tokio::test]
    async fn test_mobile_only_without_scrubbing() {
        let config = CaptureConfig {
            desktop: false,
            scrub_content: false,
            settle_delay_ms: 0,
            ..CaptureConfig::default()
        };
        let service = CaptureService::from_config(&config);
        let mut page = Recorder::default();

        let written = service.capture(&mut page, Path::new("out"), "a").await.unwrap();

        assert_eq!(written.len(), 1);
        assert!(!page.calls.iter().any(|c| c == "scrub"));
        assert!(!page.calls.iter().any(|c| c.starts_with("viewport")));
    }

    #[test]
    fn test_kinds() {
        let config = CaptureConfig {
            mobile: false,
            ..CaptureConfig::default()
        };
        assert_eq!(
            CaptureService::from_config(&config).kinds(),
            vec![ScreenshotKind::Desktop]
        );
    }
}
