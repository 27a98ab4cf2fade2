//! Custom error types for docs-differ
//!
//! Provides a unified error handling system across all modules.

use std::fmt;

use thiserror::Error;

/// Categories of navigation failure reported by a renderer.
///
/// Some of these are transient enough that a single extra navigation attempt
/// is worth making before a page is given up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationErrorKind {
    /// The page or its browser context was destroyed mid-operation
    TargetClosed,
    /// Navigation did not finish in time
    Timeout,
    /// The host name could not be resolved
    NameNotResolved,
    /// Anything else
    Other,
}

impl NavigationErrorKind {
    /// Classify a renderer error message
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("target closed")
            || lower.contains("target page, context or browser has been closed")
            || lower.contains("context was destroyed")
        {
            Self::TargetClosed
        } else if lower.contains("timeout") || lower.contains("timed out") {
            Self::Timeout
        } else if lower.contains("err_name_not_resolved") {
            Self::NameNotResolved
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for NavigationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationErrorKind::TargetClosed => write!(f, "target closed"),
            NavigationErrorKind::Timeout => write!(f, "navigation timeout"),
            NavigationErrorKind::NameNotResolved => write!(f, "name not resolved"),
            NavigationErrorKind::Other => write!(f, "navigation failed"),
        }
    }
}

/// Main error type for docs-differ operations
#[derive(Error, Debug)]
pub enum DifferError {
    /// A page could not be navigated to
    #[error("Navigation error ({kind}) for {url}: {message}")]
    Navigation {
        url: String,
        kind: NavigationErrorKind,
        message: String,
    },

    /// Browser automation errors
    #[error("Renderer error: {0}")]
    Renderer(String),

    /// Screenshot or DOM evaluation errors
    #[error("Capture error: {0}")]
    Capture(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Screenshot comparison errors
    #[error("Diff error: {0}")]
    Diff(String),

    /// Agent-browser not installed
    #[error("agent-browser not found. Install with: npm install -g agent-browser && agent-browser install")]
    AgentBrowserNotFound,

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Convenience Result type for docs-differ operations
pub type Result<T> = std::result::Result<T, DifferError>;

impl DifferError {
    /// Create a navigation error, classifying the message
    pub fn navigation(url: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Navigation {
            url: url.into(),
            kind: NavigationErrorKind::classify(&message),
            message,
        }
    }

    /// Create a renderer error
    pub fn renderer(msg: impl Into<String>) -> Self {
        Self::Renderer(msg.into())
    }

    /// Create a capture error
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a diff error
    pub fn diff(msg: impl Into<String>) -> Self {
        Self::Diff(msg.into())
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// The navigation failure category, if this is a navigation-ish error.
    ///
    /// Capture errors are classified too: a page that dies during a
    /// screenshot reports the same messages as one that dies while loading.
    pub fn navigation_kind(&self) -> Option<NavigationErrorKind> {
        match self {
            Self::Navigation { kind, .. } => Some(*kind),
            Self::Renderer(msg) | Self::Capture(msg) => Some(NavigationErrorKind::classify(msg)),
            _ => None,
        }
    }
}
