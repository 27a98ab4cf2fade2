//! Visited page registry
//!
//! The single synchronization point of a crawl: every page is reserved here
//! before its capture task is queued, so a page discovered by several
//! in-flight visits at once is captured only once.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Index document a directory URL may or may not spell out
pub const INDEX_DOCUMENT: &str = "index.html";

/// Result of a reservation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// The caller owns the page and must queue its capture
    Reserved,
    /// The page, or an index-document variant of it, is already taken
    AlreadyVisited,
    /// The session has reserved as many pages as it may
    LimitReached,
}

/// Page path → expected screenshot filenames, for one session
#[derive(Debug, Default)]
pub struct VisitedRegistry {
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl VisitedRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Vec<String>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `path` unless it or an index-document variant is already present
    pub fn try_reserve(&self, path: &str, filenames: Vec<String>) -> bool {
        self.reserve(path, filenames, None) == Reservation::Reserved
    }

    /// Claim `path`, refusing once `limit` pages are held.
    ///
    /// The visited check, the limit check and the insert happen under one
    /// lock.
    pub fn reserve(&self, path: &str, filenames: Vec<String>, limit: Option<usize>) -> Reservation {
        let mut entries = self.entries();

        if equivalent_keys(path)
            .iter()
            .any(|key| entries.contains_key(key))
        {
            return Reservation::AlreadyVisited;
        }

        if limit.is_some_and(|max| entries.len() >= max) {
            return Reservation::LimitReached;
        }

        entries.insert(path.to_string(), filenames);
        Reservation::Reserved
    }

    /// Whether `path` or one of its variants has been reserved
    pub fn contains(&self, path: &str) -> bool {
        let entries = self.entries();
        equivalent_keys(path)
            .iter()
            .any(|key| entries.contains_key(key))
    }

    /// Number of reserved pages
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether nothing has been reserved yet
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Sorted copy of every reservation
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.entries()
            .iter()
            .map(|(path, files)| (path.clone(), files.clone()))
            .collect()
    }
}

/// Keys naming the same logical page as `path`: itself, with the index
/// document appended, and with a trailing index document removed.
fn equivalent_keys(path: &str) -> Vec<String> {
    let mut keys = vec![path.to_string()];

    if let Some(dir) = path.strip_suffix(INDEX_DOCUMENT) {
        keys.push(dir.to_string());
        let trimmed = dir.trim_end_matches('/');
        if !trimmed.is_empty() {
            keys.push(trimmed.to_string());
        }
    } else if path.ends_with('/') {
        keys.push(format!("{}{}", path, INDEX_DOCUMENT));
    } else {
        keys.push(format!("{}{}", path, INDEX_DOCUMENT));
        keys.push(format!("{}/{}", path, INDEX_DOCUMENT));
    }

    keys
}
