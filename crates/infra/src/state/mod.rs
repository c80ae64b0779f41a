//! State store backends
//!
//! File-backed state lives in `decant-common`; this module adds the
//! networked backend for deployments that keep credentials in a versioned
//! secret store.

pub mod vault;

pub use vault::VaultStateStore;
