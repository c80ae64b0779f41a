//! Configuration loading
//!
//! The configuration data shapes live in `decant-domain`; this module only
//! finds, parses, and validates them. Environment variables win over files.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file};
