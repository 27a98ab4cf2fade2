//! Diff report types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A screenshot present on both sides whose contents differ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedScreenshot {
    /// Artifact filename shared by both sides
    pub filename: String,
    pub baseline: PathBuf,
    pub current: PathBuf,
    /// Image written to the diff directory, if the differ produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<PathBuf>,
}

/// Outcome of comparing two screenshot directories
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    /// Pairs whose contents differ
    pub changed: Vec<ChangedScreenshot>,
    /// Only in the current directory
    pub added: Vec<String>,
    /// Only in the baseline directory
    pub removed: Vec<String>,
    /// Pairs that matched
    pub unchanged: usize,
}

impl DiffReport {
    /// Whether anything differs between the two sides
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty() || !self.added.is_empty() || !self.removed.is_empty()
    }

    /// Filenames of every changed pair
    pub fn changed_filenames(&self) -> Vec<&str> {
        self.changed.iter().map(|c| c.filename.as_str()).collect()
    }
}
