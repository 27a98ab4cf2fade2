//! Shared types used across docs-differ modules
//!
//! Contains viewport profiles, crawl tasks and diagnostic records.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

/// A browser viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// The most common desktop browser viewport
    pub const DESKTOP: Viewport = Viewport {
        width: 1366,
        height: 784,
    };

    /// Create a new viewport
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A device to emulate for mobile captures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Device name as understood by the browser (e.g. "iPhone 11")
    pub name: String,
    /// Viewport of the device
    pub viewport: Viewport,
    /// Device pixel ratio
    pub scale_factor: f32,
    /// Whether the device reports itself as mobile and supports touch
    pub is_mobile: bool,
}

impl DeviceProfile {
    /// iPhone 11 as defined by Chrome's device emulation list
    pub fn iphone_11() -> Self {
        Self {
            name: "iPhone 11".to_string(),
            viewport: Viewport::new(414, 896),
            scale_factor: 2.0,
            is_mobile: true,
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::iphone_11()
    }
}

/// The two kinds of screenshot taken for each page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotKind {
    Desktop,
    Mobile,
}

impl ScreenshotKind {
    /// Both kinds, in capture order
    pub const ALL: [ScreenshotKind; 2] = [ScreenshotKind::Desktop, ScreenshotKind::Mobile];

    /// The artifact filename for a base filename
    pub fn filename(&self, base: &str) -> String {
        format!("{}_{}.png", base, self)
    }

    /// The artifact path inside a storage directory
    pub fn path_in(&self, storage_dir: &Path, base: &str) -> PathBuf {
        storage_dir.join(self.filename(base))
    }
}

impl fmt::Display for ScreenshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenshotKind::Desktop => write!(f, "desktop"),
            ScreenshotKind::Mobile => write!(f, "mobile"),
        }
    }
}

/// Result of a single navigation as reported by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationOutcome {
    /// HTTP status of the main document, when the renderer knows it
    pub status: Option<u16>,
}

impl NavigationOutcome {
    /// A navigation with a known status code
    pub fn with_status(status: u16) -> Self {
        Self {
            status: Some(status),
        }
    }

    /// A navigation whose status could not be determined
    pub fn unknown() -> Self {
        Self { status: None }
    }

    /// Whether the page loaded successfully.
    ///
    /// An unknown status counts as success: the page rendered something.
    pub fn is_ok(&self) -> bool {
        self.status.map_or(true, |s| (200..300).contains(&s))
    }
}

/// One page queued for capture. Consumed exactly once by a worker.
#[derive(Debug, Clone)]
pub struct CaptureTask {
    /// Page to visit, fragment already stripped
    pub url: Url,
    /// Base filename for the page's screenshots
    pub base_filename: String,
    /// Root path the crawl is scoped to
    pub root_path: String,
    /// Directory the screenshots are written to
    pub storage_dir: PathBuf,
}

/// A same-host link that fell outside the crawl scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadUrlRecord {
    /// Page the link was found on
    pub parent_url: String,
    /// The raw link
    pub bad_url: String,
}

impl BadUrlRecord {
    /// Create a new record
    pub fn new(parent_url: impl Into<String>, bad_url: impl Into<String>) -> Self {
        Self {
            parent_url: parent_url.into(),
            bad_url: bad_url.into(),
        }
    }
}

impl fmt::Display for BadUrlRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (found on {})", self.bad_url, self.parent_url)
    }
}
