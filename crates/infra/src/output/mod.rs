//! Report persistence
//!
//! Finished extraction reports land as timestamped artifacts under a
//! per-resource directory. NDJSON output writes a metadata line followed by
//! one line per record; JSON output writes the whole report as one pretty
//! document.

pub mod report;
pub mod store;

pub use report::ReportWriter;
pub use store::{ArtifactStore, LocalDirStore};
