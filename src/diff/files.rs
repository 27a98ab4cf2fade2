//! Byte-exact screenshot comparison
//!
//! Flags any screenshot pair whose files are not identical and copies the
//! current version into the diff directory for review. Headless captures of
//! an unchanged page are byte-stable, so this needs no image decoding; it
//! ignores the sensitivity threshold.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::fs;
use tracing::debug;

use crate::core::{DifferError, Result};
use crate::diff::report::{ChangedScreenshot, DiffReport};
use crate::diff::traits::Differ;

const SCREENSHOT_EXTENSION: &str = "png";

/// Compares screenshot files byte for byte
#[derive(Debug, Clone)]
pub struct FileDiffer {
    /// Pairs compared at once
    concurrency: usize,
}

impl FileDiffer {
    pub fn new() -> Self {
        Self { concurrency: 16 }
    }

    /// Limit how many pairs are read at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

impl Default for FileDiffer {
    fn default() -> Self {
        Self::new()
    }
}

async fn list_screenshots(dir: &Path) -> Result<BTreeSet<String>> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| DifferError::with_context(format!("Failed to read {}", dir.display()), e))?;

    let mut names = BTreeSet::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_screenshot = entry.file_type().await?.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(SCREENSHOT_EXTENSION));

        if is_screenshot {
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }

    Ok(names)
}

async fn same_contents(a: &Path, b: &Path) -> Result<bool> {
    if fs::metadata(a).await?.len() != fs::metadata(b).await?.len() {
        return Ok(false);
    }
    Ok(fs::read(a).await? == fs::read(b).await?)
}

#[async_trait]
impl Differ for FileDiffer {
    async fn diff(
        &self,
        baseline: &Path,
        current: &Path,
        output: &Path,
        _threshold: f64,
    ) -> Result<DiffReport> {
        let baseline_files = list_screenshots(baseline).await?;
        let current_files = list_screenshots(current).await?;

        let removed = baseline_files.difference(&current_files).cloned().collect();
        let added = current_files.difference(&baseline_files).cloned().collect();

        let common: Vec<String> = baseline_files
            .intersection(&current_files)
            .cloned()
            .collect();

        let comparisons = common.into_iter().map(|name| {
            let before = baseline.join(&name);
            let after = current.join(&name);
            async move {
                let same = same_contents(&before, &after).await?;
                Ok::<_, DifferError>((name, before, after, same))
            }
        });

        let results: Vec<Result<(String, PathBuf, PathBuf, bool)>> = stream::iter(comparisons)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = DiffReport {
            added,
            removed,
            ..Default::default()
        };

        for result in results {
            let (filename, before, after, same) = result?;
            if same {
                report.unchanged += 1;
                continue;
            }

            let diff_path = output.join(&filename);
            fs::copy(&after, &diff_path).await.map_err(|e| {
                DifferError::with_context(format!("Failed to write {}", diff_path.display()), e)
            })?;
            debug!(file = %filename, "screenshot changed");

            report.changed.push(ChangedScreenshot {
                filename,
                baseline: before,
                current: after,
                diff: Some(diff_path),
            });
        }

        report.changed.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(report)
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, bytes: &[u8]) {
        std::fs::write(dir.join(name), bytes).unwrap();
    }

    #[tokio::test]
    async fn test_detects_changed_added_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let (baseline, current, output) = (
            tmp.path().join("baseline"),
            tmp.path().join("current"),
            tmp.path().join("diff"),
        );
        for dir in [&baseline, &current, &output] {
            std::fs::create_dir_all(dir).unwrap();
        }

        write(&baseline, "a_desktop.png", b"same");
        write(&current, "a_desktop.png", b"same");
        write(&baseline, "b_desktop.png", b"before");
        write(&current, "b_desktop.png", b"after!");
        write(&baseline, "gone_desktop.png", b"x");
        write(&current, "new_desktop.png", b"y");
        write(&current, "notes.txt", b"ignored");

        let report = FileDiffer::new()
            .diff(&baseline, &current, &output, 0.03)
            .await
            .unwrap();

        assert_eq!(report.changed_filenames(), vec!["b_desktop.png"]);
        assert_eq!(report.added, vec!["new_desktop.png".to_string()]);
        assert_eq!(report.removed, vec!["gone_desktop.png".to_string()]);
        assert_eq!(report.unchanged, 1);
        assert_eq!(std::fs::read(output.join("b_desktop.png")).unwrap(), b"after!");
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = FileDiffer::new()
            .diff(&tmp.path().join("nope"), tmp.path(), tmp.path(), 0.03)
            .await;
        assert!(result.is_err());
    }
}
