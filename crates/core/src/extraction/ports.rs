//! Port interfaces for extraction
//!
//! These traits define the boundary between the extraction pipeline and the
//! upstream API adapter. Rate limiting and authentication live behind the
//! gateway; the pipeline never sees either.

use async_trait::async_trait;
use decant_domain::{DateWindow, EntityId, ResourceSpec, Result};
use serde_json::Value;

/// Trait for reaching the upstream API
///
/// Implementations pace every call through the global rate limiter and
/// handle bearer authentication, including the one-retry 401 recovery.
/// Errors surfacing here have already exhausted the transport's own retry
/// policy.
#[async_trait]
pub trait ExtractionGateway: Send + Sync {
    /// Fetch one listing page of a resource
    ///
    /// Returns the page's raw listing records in listing order. Windowed
    /// resources carry the date range on every listing call.
    async fn list_page(
        &self,
        resource: &ResourceSpec,
        page: u32,
        limit: u32,
        window: Option<&DateWindow>,
    ) -> Result<Vec<Value>>;

    /// Fetch the full detail payload of one entity
    async fn fetch_detail(&self, resource: &ResourceSpec, id: &EntityId) -> Result<Value>;

    /// Fetch a whole singleton collection with one call
    async fn fetch_collection(&self, resource: &ResourceSpec) -> Result<Vec<Value>>;
}
