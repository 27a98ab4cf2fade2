//! Diff invocation
//!
//! Runs a [`Differ`] once both crawl sessions have written their screenshots.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::core::{DifferError, Result};
use crate::diff::report::DiffReport;
use crate::diff::traits::Differ;

/// Runs the configured differ over a baseline and a current directory
#[derive(Clone)]
pub struct DiffInvoker {
    differ: Arc<dyn Differ>,
    threshold: f64,
}

impl DiffInvoker {
    pub fn new(differ: Arc<dyn Differ>, threshold: f64) -> Self {
        Self { differ, threshold }
    }

    /// Compare the two directories, writing diff artifacts into `output`.
    ///
    /// Both input directories must exist. Differ failures are returned as-is.
    pub async fn invoke(&self, baseline: &Path, current: &Path, output: &Path) -> Result<DiffReport> {
        for dir in [baseline, current] {
            if !dir.is_dir() {
                return Err(DifferError::diff(format!(
                    "screenshot directory {} does not exist",
                    dir.display()
                )));
            }
        }

        tokio::fs::create_dir_all(output).await.map_err(|e| {
            DifferError::with_context(format!("Failed to create {}", output.display()), e)
        })?;

        info!(
            differ = self.differ.name(),
            baseline = %baseline.display(),
            current = %current.display(),
            threshold = self.threshold,
            "running diff"
        );

        let report = self
            .differ
            .diff(baseline, current, output, self.threshold)
            .await?;

        info!(
            changed = report.changed.len(),
            added = report.added.len(),
            removed = report.removed.len(),
            unchanged = report.unchanged,
            "diff finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Failing;

    #[async_trait]
    impl Differ for Failing {
        async fn diff(&self, _: &Path, _: &Path, _: &Path, _: f64) -> Result<DiffReport> {
            Err(DifferError::diff("images have different dimensions"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_missing_input_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let invoker = DiffInvoker::new(Arc::new(Failing), 0.03);
        let err = invoker
            .invoke(&tmp.path().join("baseline"), tmp.path(), &tmp.path().join("diff"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_differ_failure_propagates() {
        let tmp = tempfile::tempdir().unwrap();
        let invoker = DiffInvoker::new(Arc::new(Failing), 0.03);
        let err = invoker
            .invoke(tmp.path(), tmp.path(), &tmp.path().join("diff"))
            .await
            .unwrap_err();
        assert!(matches!(err, DifferError::Diff(_)));
        assert!(tmp.path().join("diff").is_dir());
    }
}
