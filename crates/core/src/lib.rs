//! # Decant Core
//!
//! Pure extraction engine logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - The extraction pipeline (discover, fetch, recover, consolidate)
//! - Port/adapter interfaces (traits)
//! - Progress accounting
//!
//! ## Architecture Principles
//! - Only depends on `decant-common` and `decant-domain`
//! - No HTTP or filesystem code
//! - The upstream API is reached through the `ExtractionGateway` trait
//! - Pure, testable pipeline logic

pub mod extraction;

// Re-export specific items to avoid ambiguity
pub use extraction::collector::PageCollector;
pub use extraction::consolidate::consolidate;
pub use extraction::fetcher::BatchFetcher;
pub use extraction::ports::ExtractionGateway;
pub use extraction::progress::{ProgressSummary, ProgressTracker};
pub use extraction::retry::RetryCoordinator;
pub use extraction::ExtractionService;
