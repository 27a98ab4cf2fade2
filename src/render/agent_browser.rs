//! agent-browser backend
//!
//! Drives pages through the agent-browser CLI. Every crawl worker gets its own
//! agent-browser session so parallel tasks never share page state, and every
//! task closes its session when done so the next one starts from a clean
//! browser context.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use url::Url;

use crate::core::config::BrowserConfig;
use crate::core::{DeviceProfile, DifferError, NavigationOutcome, Result, Viewport};
use crate::render::traits::{BrowserLauncher, PageRenderer};

const NAVIGATION_STATUS_SCRIPT: &str =
    "(performance.getEntriesByType('navigation')[0] || {}).responseStatus || 0";

const ANCHOR_HREFS_SCRIPT: &str =
    "JSON.stringify(Array.from(document.querySelectorAll('a[href]'), a => a.href))";

/// Launches agent-browser sessions, one per crawl worker
#[derive(Debug, Clone)]
pub struct AgentBrowserLauncher {
    binary: String,
    session_prefix: String,
    headed: bool,
}

impl AgentBrowserLauncher {
    /// Create a launcher from browser configuration
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            session_prefix: config.session_prefix.clone(),
            headed: config.headed,
        }
    }

    /// Check if agent-browser is installed
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn session_name(&self, worker: usize) -> String {
        format!("{}-{}", self.session_prefix, worker)
    }
}

#[async_trait]
impl BrowserLauncher for AgentBrowserLauncher {
    async fn prepare(&self) -> Result<()> {
        if self.is_available().await {
            Ok(())
        } else {
            Err(DifferError::AgentBrowserNotFound)
        }
    }

    async fn new_page(&self, worker: usize) -> Result<Box<dyn PageRenderer>> {
        Ok(Box::new(AgentBrowserPage {
            binary: self.binary.clone(),
            session_name: self.session_name(worker),
            headed: self.headed,
        }))
    }

    fn name(&self) -> &str {
        "agent-browser"
    }
}

/// A page backed by one agent-browser session
#[derive(Debug)]
pub struct AgentBrowserPage {
    binary: String,
    session_name: String,
    headed: bool,
}

impl AgentBrowserPage {
    /// Run an agent-browser command
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["--session", self.session_name.as_str()]);

        if self.headed {
            cmd.arg("--headed");
        }

        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DifferError::AgentBrowserNotFound
            } else {
                DifferError::renderer(format!("Failed to run agent-browser: {}", e))
            }
        })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(DifferError::renderer(format!(
                "agent-browser {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )))
        }
    }
}

#[async_trait]
impl PageRenderer for AgentBrowserPage {
    async fn goto(&mut self, url: &Url) -> Result<NavigationOutcome> {
        self.run_command(&["open", url.as_str()])
            .await
            .map_err(|e| DifferError::navigation(url.as_str(), e.to_string()))?;

        // Best effort: a page can render without exposing timing entries
        let _ = self.run_command(&["wait", "--load", "networkidle"]).await;

        let status = self
            .evaluate(NAVIGATION_STATUS_SCRIPT)
            .await
            .ok()
            .and_then(|out| parse_status(&out));

        Ok(match status {
            Some(code) => NavigationOutcome::with_status(code),
            None => NavigationOutcome::unknown(),
        })
    }

    async fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        let width = viewport.width.to_string();
        let height = viewport.height.to_string();
        self.run_command(&["set", "viewport", &width, &height])
            .await
            .map(|_| ())
    }

    async fn emulate(&mut self, device: &DeviceProfile) -> Result<()> {
        self.run_command(&["set", "device", &device.name])
            .await
            .map(|_| ())
    }

    async fn screenshot(&mut self, path: &Path, full_page: bool) -> Result<()> {
        let path = path.to_string_lossy().into_owned();
        let mut args = vec!["screenshot", path.as_str()];

        if full_page {
            args.push("--full");
        }

        self.run_command(&args)
            .await
            .map(|_| ())
            .map_err(|e| DifferError::capture(e.to_string()))
    }

    async fn evaluate(&mut self, script: &str) -> Result<String> {
        self.run_command(&["eval", script])
            .await
            .map(|s| s.trim().to_string())
    }

    async fn extract_anchor_hrefs(&mut self) -> Result<Vec<String>> {
        let output = self.evaluate(ANCHOR_HREFS_SCRIPT).await?;
        parse_hrefs(&output)
    }

    async fn close(&mut self) -> Result<()> {
        self.run_command(&["close"]).await.map(|_| ())
    }
}

fn parse_status(output: &str) -> Option<u16> {
    output
        .trim()
        .trim_matches('"')
        .parse::<u16>()
        .ok()
        .filter(|&code| code > 0)
}

/// `eval` prints the script's value; a JSON string result may come back
/// quoted once more.
fn parse_hrefs(output: &str) -> Result<Vec<String>> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if let Ok(hrefs) = serde_json::from_str::<Vec<String>>(trimmed) {
        return Ok(hrefs);
    }

    let inner: String = serde_json::from_str(trimmed)?;
    Ok(serde_json::from_str(&inner)?)
}
