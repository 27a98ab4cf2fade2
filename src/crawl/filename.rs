//! Filename derivation
//!
//! Maps a page URL to the base filename its screenshots are stored under, and
//! to the key it is deduplicated by. Sites come in different shapes, so the
//! mapping is a list of strategies tried in order; the first that recognises
//! the URL wins.

use std::fmt;

use url::Url;

use crate::core::ScreenshotKind;

/// Marker replacing `/` so nested pages flatten into one directory
pub const DIRECTORY_MARKER: &str = "~~";

/// Base filename used for the crawl root itself
pub const ROOT_FILENAME: &str = "index";

/// Name and dedup key derived for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedName {
    /// Key the page is reserved under in the visited registry
    pub visit_key: String,
    /// Base filename, without kind suffix or extension
    pub base: String,
}

impl DerivedName {
    /// Expected screenshot filenames, desktop first
    pub fn artifact_filenames(&self) -> Vec<String> {
        ScreenshotKind::ALL
            .iter()
            .map(|kind| kind.filename(&self.base))
            .collect()
    }
}

/// One way of naming pages
pub trait FilenameStrategy: Send + Sync + fmt::Debug {
    /// Name the page, or `None` if this strategy does not apply to the URL
    fn derive(&self, url: &Url, root_path: &str) -> Option<DerivedName>;
}

/// Component-catalog pages (`iframe.html?id=button--primary`) share one path
/// and are told apart only by a query parameter.
#[derive(Debug, Clone)]
pub struct QueryIdStrategy {
    param: String,
}

impl QueryIdStrategy {
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
        }
    }
}

impl Default for QueryIdStrategy {
    fn default() -> Self {
        Self::new("id")
    }
}

impl FilenameStrategy for QueryIdStrategy {
    fn derive(&self, url: &Url, _root_path: &str) -> Option<DerivedName> {
        let id = url
            .query_pairs()
            .find(|(key, value)| key == self.param.as_str() && !value.is_empty())
            .map(|(_, value)| value.into_owned())?;

        Some(DerivedName {
            visit_key: format!("{}?{}={}", url.path(), self.param, id),
            base: flatten_separators(&id),
        })
    }
}

/// Replace path separators so a page-supplied name stays a single file name.
///
/// With no separator left, `..` can no longer form a parent segment.
fn flatten_separators(name: &str) -> String {
    name.replace(['/', '\\'], DIRECTORY_MARKER)
}

/// Documentation-style pages named after their path below the crawl root
#[derive(Debug, Clone, Copy, Default)]
pub struct PathStrategy;

impl FilenameStrategy for PathStrategy {
    fn derive(&self, url: &Url, root_path: &str) -> Option<DerivedName> {
        Some(DerivedName {
            visit_key: url.path().to_string(),
            base: path_base(url.path(), root_path),
        })
    }
}

/// Base filename for a URL path below `root_path`.
///
/// `/docs/sub/page.html` under `/docs` becomes `sub~~page`.
pub fn path_base(path: &str, root_path: &str) -> String {
    let relative = path.replacen(root_path, "", 1);
    let relative = relative.strip_prefix('/').unwrap_or(&relative);
    let stem = relative.split('.').next().unwrap_or_default();
    let base = stem.replace('/', DIRECTORY_MARKER);

    if base.is_empty() {
        ROOT_FILENAME.to_string()
    } else {
        base
    }
}

/// Ordered list of filename strategies
#[derive(Debug)]
pub struct FilenameDeriver {
    strategies: Vec<Box<dyn FilenameStrategy>>,
}

impl FilenameDeriver {
    /// Create a deriver from an explicit strategy list
    pub fn new(strategies: Vec<Box<dyn FilenameStrategy>>) -> Self {
        Self { strategies }
    }

    /// Try `strategy` before every existing one
    pub fn with_strategy(mut self, strategy: impl FilenameStrategy + 'static) -> Self {
        self.strategies.insert(0, Box::new(strategy));
        self
    }

    /// Name a page. Falls back to path naming when no strategy applies.
    pub fn derive(&self, url: &Url, root_path: &str) -> DerivedName {
        self.strategies
            .iter()
            .find_map(|strategy| strategy.derive(url, root_path))
            .unwrap_or_else(|| DerivedName {
                visit_key: url.path().to_string(),
                base: path_base(url.path(), root_path),
            })
    }
}

impl Default for FilenameDeriver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(QueryIdStrategy::default()),
            Box::new(PathStrategy),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(url: &str, root_path: &str) -> DerivedName {
        FilenameDeriver::default().derive(&Url::parse(url).unwrap(), root_path)
    }

    #[test]
    fn test_strips_root_and_extension() {
        let name = derive("https://example.com/docs/intro.html", "/docs");
        assert_eq!(name.base, "intro");
        assert_eq!(name.visit_key, "/docs/intro.html");
    }

    #[test]
    fn test_flattens_subdirectories() {
        assert_eq!(derive("https://example.com/docs/sub/page.html", "/docs").base, "sub~~page");
        assert_eq!(
            derive("https://example.com/docs/a/b/c.html", "/docs").base,
            "a~~b~~c"
        );
    }

    #[test]
    fn test_nested_name_does_not_collide_with_flat_name() {
        let nested = derive("https://example.com/docs/sub/page.html", "/docs");
        let flat = derive("https://example.com/docs/subpage.html", "/docs");
        assert_ne!(nested.base, flat.base);
    }

    #[test]
    fn test_root_page_gets_index() {
        assert_eq!(derive("https://example.com/docs/", "/docs").base, "index");
        assert_eq!(derive("https://example.com/", "").base, "index");
    }

    #[test]
    fn test_root_path_removed_wherever_it_appears() {
        assert_eq!(path_base("/v2/docs/intro.html", "/docs"), "v2~~intro");
    }

    #[test]
    fn test_splits_on_first_dot() {
        assert_eq!(derive("https://example.com/v1.2/page.html", "").base, "v1");
    }

    #[test]
    fn test_query_id_wins() {
        let name = derive(
            "https://example.com/storybook/iframe.html?id=button--primary&viewMode=story",
            "/storybook",
        );
        assert_eq!(name.base, "button--primary");
        assert_eq!(name.visit_key, "/storybook/iframe.html?id=button--primary");
    }

    #[test]
    fn test_query_id_separators_are_flattened() {
        let nested = derive("https://example.com/storybook/iframe.html?id=a/b", "/storybook");
        assert_eq!(nested.base, "a~~b");

        let escaping = derive("https://example.com/storybook/iframe.html?id=../x", "/storybook");
        assert_eq!(escaping.base, "..~~x");
        assert_eq!(escaping.visit_key, "/storybook/iframe.html?id=../x");

        let backslash = derive("https://example.com/storybook/iframe.html?id=..%5Cx", "/storybook");
        assert_eq!(backslash.base, "..~~x");
    }

    #[test]
    fn test_query_id_artifacts_stay_in_storage_dir() {
        let storage = std::path::Path::new("store");
        for id in ["../escaped", "a/b/../../c", "..", "/abs"] {
            let url = Url::parse_with_params("https://example.com/sb/iframe.html", &[("id", id)]).unwrap();
            let name = derive(url.as_str(), "/sb");
            for kind in ScreenshotKind::ALL {
                let path = kind.path_in(storage, &name.base);
                assert_eq!(path.parent(), Some(storage), "{id} -> {}", path.display());
            }
        }
    }

    #[test]
    fn test_empty_query_id_falls_back_to_path() {
        assert_eq!(derive("https://example.com/docs/a.html?id=", "/docs").base, "a");
    }

    #[test]
    fn test_deterministic() {
        let url = "https://example.com/docs/sub/page.html";
        assert_eq!(derive(url, "/docs"), derive(url, "/docs"));
    }

    #[test]
    fn test_artifact_filenames() {
        let name = derive("https://example.com/docs/intro.html", "/docs");
        assert_eq!(
            name.artifact_filenames(),
            vec!["intro_desktop.png".to_string(), "intro_mobile.png".to_string()]
        );
    }

    #[derive(Debug)]
    struct Fixed;

    impl FilenameStrategy for Fixed {
        fn derive(&self, url: &Url, _root_path: &str) -> Option<DerivedName> {
            url.path().starts_with("/api/").then(|| DerivedName {
                visit_key: url.path().to_string(),
                base: "api".to_string(),
            })
        }
    }

    #[test]
    fn test_custom_strategy_takes_precedence() {
        let deriver = FilenameDeriver::default().with_strategy(Fixed);
        let api = deriver.derive(&Url::parse("https://example.com/api/x.html").unwrap(), "");
        let docs = deriver.derive(&Url::parse("https://example.com/docs/x.html").unwrap(), "");
        assert_eq!(api.base, "api");
        assert_eq!(docs.base, "docs~~x");
    }

    #[test]
    fn test_empty_deriver_falls_back_to_path() {
        let deriver = FilenameDeriver::new(Vec::new());
        let name = deriver.derive(&Url::parse("https://example.com/docs/x.html?id=a").unwrap(), "/docs");
        assert_eq!(name.base, "x");
    }
}
