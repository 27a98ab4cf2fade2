//! Diff module - comparing the baseline and current screenshot sets

mod files;
mod invoker;
pub mod report;
pub mod traits;

pub use files::FileDiffer;
pub use invoker::DiffInvoker;
pub use report::{ChangedScreenshot, DiffReport};
pub use traits::Differ;
