//! Resilient HTTP transport
//!
//! Wraps `reqwest` with the timeout and retry behavior shared by every
//! outbound call the extractor makes.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
