//! Differ trait for abstracting screenshot comparison backends

use std::path::Path;

use async_trait::async_trait;

use crate::core::Result;
use crate::diff::report::DiffReport;

/// Compares two directories of screenshots
#[async_trait]
pub trait Differ: Send + Sync {
    /// Compare `baseline` against `current`, writing any diff artifacts into
    /// `output`. `threshold` is the share of a screenshot (0.0 - 1.0) that
    /// may change before it is flagged, for backends that measure it.
    async fn diff(
        &self,
        baseline: &Path,
        current: &Path,
        output: &Path,
        threshold: f64,
    ) -> Result<DiffReport>;

    /// Get the differ name
    fn name(&self) -> &str;
}
