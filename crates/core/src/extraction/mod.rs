//! Bulk extraction pipeline
//!
//! One resource run flows through four phases: discover every entity id from
//! the listing pages, fetch detail payloads in bounded concurrent batches,
//! sequentially retry what failed, and consolidate everything into a tagged
//! report.

pub mod collector;
pub mod consolidate;
pub mod fetcher;
pub mod ports;
pub mod progress;
pub mod retry;
pub mod service;

#[cfg(test)]
pub(crate) mod testkit;

pub use collector::PageCollector;
pub use consolidate::consolidate;
pub use fetcher::BatchFetcher;
pub use ports::ExtractionGateway;
pub use progress::{ProgressSummary, ProgressTracker};
pub use retry::RetryCoordinator;
pub use service::ExtractionService;
