//! Browser rendering module
//!
//! The page renderer contract and its agent-browser implementation.

mod agent_browser;
pub mod traits;

pub use agent_browser::{AgentBrowserLauncher, AgentBrowserPage};
pub use traits::{BrowserLauncher, PageRenderer};
