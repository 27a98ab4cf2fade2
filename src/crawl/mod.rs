//! Crawl module - recursive same-origin discovery and capture
//!
//! - **filename**: URL → screenshot base filename strategies
//! - **registry**: per-session dedup of visited pages
//! - **ledger**: out-of-scope links kept for diagnostics
//! - **retry**: navigation retry policy
//! - **visitor**: one page's navigate / capture / extract cycle
//! - **scheduler**: bounded worker pool driving the walk
//! - **session**: one crawl of one site variant

pub mod filename;
pub mod ledger;
pub mod registry;
pub mod retry;
pub mod scheduler;
pub mod session;
pub mod visitor;

pub use filename::{DerivedName, FilenameDeriver, FilenameStrategy, PathStrategy, QueryIdStrategy};
pub use ledger::BadUrlLedger;
pub use registry::{Reservation, VisitedRegistry};
pub use retry::RetryPolicy;
pub use scheduler::{CrawlScheduler, CrawlStats};
pub use session::{CrawlSession, SessionOptions, SessionReport};
pub use visitor::{LinkScope, LinkVerdict, PageVisit, PageVisitor};
