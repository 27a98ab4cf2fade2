//! Capture module - desktop and mobile screenshots of a rendered page

pub mod scrub;
mod service;

pub use service::CaptureService;
