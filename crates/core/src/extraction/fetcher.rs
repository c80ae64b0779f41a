//! Detail fetching for one batch of entity ids

use std::sync::Arc;

use decant_domain::{Batch, BatchResult, ResourceSpec};
use tracing::{debug, warn};

use super::ports::ExtractionGateway;

/// Fetches detail payloads for every id in a batch
///
/// A batch never fails as a whole. Each id is fetched on its own, failures
/// are recorded against the id, and the remaining ids keep going, so the
/// result always accounts for the full batch.
pub struct BatchFetcher {
    gateway: Arc<dyn ExtractionGateway>,
}

impl BatchFetcher {
    pub fn new(gateway: Arc<dyn ExtractionGateway>) -> Self {
        Self { gateway }
    }

    /// Fetch every id in the batch, isolating per-id failures
    pub async fn fetch_batch(&self, resource: &ResourceSpec, batch: &Batch) -> BatchResult {
        let mut records = Vec::with_capacity(batch.len());
        let mut failed_ids = Vec::new();

        for id in &batch.ids {
            match self.gateway.fetch_detail(resource, id).await {
                Ok(record) => records.push(record),
                Err(error) => {
                    warn!(
                        resource = %resource.name,
                        batch = %batch.name,
                        id = %id,
                        error = %error,
                        "Detail fetch failed"
                    );
                    failed_ids.push(id.clone());
                }
            }
        }

        debug!(
            batch = %batch.name,
            successes = records.len(),
            failures = failed_ids.len(),
            "Batch fetch complete"
        );

        BatchResult { name: batch.name.clone(), records, failed_ids }
    }
}
