//! Listing-page discovery
//!
//! Walks a resource's listing pages from page 1 and accumulates every entity
//! id before any detail fetching starts. Discovery is all-or-nothing: a page
//! that cannot be fetched aborts the run rather than silently truncating the
//! id set.

use std::sync::Arc;

use decant_domain::constants::DEFAULT_PAGE_LIMIT;
use decant_domain::{DateWindow, EntityId, ExtractionError, ResourceSpec, Result};
use tracing::{debug, info};

use super::ports::ExtractionGateway;

/// Collects entity ids from sequential listing pages
pub struct PageCollector {
    gateway: Arc<dyn ExtractionGateway>,
    page_limit: u32,
}

impl PageCollector {
    pub fn new(gateway: Arc<dyn ExtractionGateway>) -> Self {
        Self { gateway, page_limit: DEFAULT_PAGE_LIMIT }
    }

    #[must_use]
    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit;
        self
    }

    /// Walk listing pages until exhaustion and return every discovered id
    ///
    /// Requests pages 1, 2, ... with the configured per-page limit and stops
    /// after the first empty or short page. A final page that is exactly full
    /// therefore costs one extra request that returns empty. Ids keep listing
    /// order across pages.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Discovery`] when a page request fails or a
    /// listing record carries no usable id. Authentication failures pass
    /// through unchanged so the caller can tell an expired grant from a
    /// broken listing.
    pub async fn collect_ids(
        &self,
        resource: &ResourceSpec,
        window: Option<&DateWindow>,
    ) -> Result<Vec<EntityId>> {
        let mut ids = Vec::new();
        let mut page = 1u32;

        loop {
            let records = self
                .gateway
                .list_page(resource, page, self.page_limit, window)
                .await
                .map_err(|error| match error {
                    ExtractionError::Auth(message) => ExtractionError::Auth(message),
                    other => ExtractionError::Discovery(format!(
                        "listing page {page} of {} failed: {other}",
                        resource.name
                    )),
                })?;

            let count = records.len();
            for record in &records {
                let id = EntityId::from_record(record).ok_or_else(|| {
                    ExtractionError::Discovery(format!(
                        "record without an id on listing page {page} of {}",
                        resource.name
                    ))
                })?;
                ids.push(id);
            }

            debug!(resource = %resource.name, page, count, "Fetched listing page");

            if count == 0 || count < self.page_limit as usize {
                break;
            }
            page += 1;
        }

        info!(
            resource = %resource.name,
            pages = page,
            ids = ids.len(),
            "Discovery complete"
        );
        Ok(ids)
    }
}
