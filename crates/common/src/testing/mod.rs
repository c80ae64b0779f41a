//! Testing utilities and helpers
//!
//! This module provides testing utilities shared by unit and integration
//! tests:
//! - **[`mocks`]**: Mock implementations of common traits
//!
//! ## Usage
//!
//! ```rust
//! use decant_common::testing::MockTokenEndpoint;
//!
//! let endpoint = MockTokenEndpoint::new();
//! endpoint.push_success("access_1", Some("refresh_2"));
//! ```

pub mod mocks;

// Re-export commonly used items
pub use mocks::MockTokenEndpoint;

// Re-export stores and clocks tests reach for most often
pub use crate::resilience::{Clock, MockClock, SystemClock};
pub use crate::state::MemoryStateStore;
