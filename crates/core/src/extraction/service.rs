//! Extraction run orchestration
//!
//! Ties the pipeline together for one resource run: discover ids, split them
//! into named batches, fan the batches out on the bounded worker pool, join
//! every handle, hand the leftovers to the retry coordinator and consolidate
//! the lot into a report. All spawned work is joined before the retry phase
//! starts, so nothing from the concurrent phase outlives the run.

use std::sync::Arc;

use decant_common::resilience::WorkerPool;
use decant_domain::constants::{
    BATCH_NAME_PREFIX, DEFAULT_BATCH_SIZE, DEFAULT_PAGE_LIMIT, DEFAULT_RETRY_MAX_ATTEMPTS,
};
use decant_domain::{
    Batch, BatchResult, DateWindow, EntityId, ExtractionError, ExtractionParams, ExtractionReport,
    ResourceKind, ResourceSpec, Result, RetryOutcome,
};
use tracing::{info, warn};

use super::collector::PageCollector;
use super::consolidate::consolidate;
use super::fetcher::BatchFetcher;
use super::ports::ExtractionGateway;
use super::progress::ProgressTracker;
use super::retry::RetryCoordinator;

/// Runs the full extraction pipeline for one resource
pub struct ExtractionService {
    gateway: Arc<dyn ExtractionGateway>,
    pool: WorkerPool,
    page_limit: u32,
    batch_size: usize,
    retry_max_attempts: u32,
}

impl ExtractionService {
    pub fn new(gateway: Arc<dyn ExtractionGateway>, pool: WorkerPool) -> Self {
        Self {
            gateway,
            pool,
            page_limit: DEFAULT_PAGE_LIMIT,
            batch_size: DEFAULT_BATCH_SIZE,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
        }
    }

    #[must_use]
    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn with_retry_max_attempts(mut self, max_attempts: u32) -> Self {
        self.retry_max_attempts = max_attempts.max(1);
        self
    }

    /// Run one extraction and return the consolidated report
    ///
    /// # Errors
    ///
    /// Fails when discovery fails, when a windowed resource is started
    /// without a window, or when authentication is lost for good. Per-id
    /// fetch failures never fail the run; they surface in the report.
    pub async fn extract(
        &self,
        resource: &ResourceSpec,
        window: Option<&DateWindow>,
    ) -> Result<ExtractionReport> {
        match resource.kind {
            ResourceKind::Singleton => self.extract_singleton(resource).await,
            ResourceKind::Paged => self.extract_paged(resource, window).await,
            ResourceKind::Windowed => {
                let window = window.ok_or_else(|| {
                    ExtractionError::InvalidInput(format!(
                        "resource {} requires a date window",
                        resource.name
                    ))
                })?;
                self.extract_paged(resource, Some(window)).await
            }
        }
    }

    async fn extract_paged(
        &self,
        resource: &ResourceSpec,
        window: Option<&DateWindow>,
    ) -> Result<ExtractionReport> {
        let collector =
            PageCollector::new(Arc::clone(&self.gateway)).with_page_limit(self.page_limit);
        let ids = collector.collect_ids(resource, window).await?;

        let total_ids = ids.len();
        let batches = self.split_into_batches(ids);
        let tracker = Arc::new(ProgressTracker::new(total_ids));
        let fetcher = Arc::new(BatchFetcher::new(Arc::clone(&self.gateway)));

        info!(
            resource = %resource.name,
            ids = total_ids,
            batches = batches.len(),
            workers = self.pool.capacity(),
            "Dispatching batches"
        );

        let mut handles = Vec::with_capacity(batches.len());
        for batch in batches {
            let fetcher = Arc::clone(&fetcher);
            let tracker = Arc::clone(&tracker);
            let task_resource = resource.clone();
            let task_batch = batch.clone();
            let handle = self
                .pool
                .spawn(async move {
                    let result = fetcher.fetch_batch(&task_resource, &task_batch).await;
                    tracker.record_batch(
                        &result.name,
                        result.success_count(),
                        result.failure_count(),
                    );
                    result
                })
                .await
                .map_err(|error| {
                    ExtractionError::Internal(format!("worker pool rejected batch: {error}"))
                })?;
            handles.push((batch, handle));
        }

        let mut batch_results = Vec::with_capacity(handles.len());
        for (batch, handle) in handles {
            match handle.await {
                Ok(result) => batch_results.push(result),
                Err(error) => {
                    warn!(
                        batch = %batch.name,
                        error = %error,
                        "Batch worker died, marking the whole batch failed"
                    );
                    tracker.record_batch(&batch.name, 0, batch.len());
                    batch_results.push(BatchResult::all_failed(&batch));
                }
            }
        }

        let failed_ids: Vec<EntityId> = batch_results
            .iter()
            .flat_map(|result| result.failed_ids.iter().cloned())
            .collect();
        let retry = RetryCoordinator::new(Arc::clone(&self.gateway))
            .with_max_attempts(self.retry_max_attempts)
            .recover(resource, failed_ids)
            .await;

        let report = consolidate(self.params_for(resource, window), batch_results, retry);
        let summary = tracker.final_summary();
        info!(
            resource = %resource.name,
            successful = report.metadata.successful_extractions,
            failed = report.metadata.failed_extractions,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "Extraction run complete"
        );
        Ok(report)
    }

    async fn extract_singleton(&self, resource: &ResourceSpec) -> Result<ExtractionReport> {
        let records = self.gateway.fetch_collection(resource).await?;
        info!(resource = %resource.name, records = records.len(), "Collection fetched");

        let result = BatchResult {
            name: format!("{BATCH_NAME_PREFIX}1"),
            records,
            failed_ids: Vec::new(),
        };
        Ok(consolidate(self.params_for(resource, None), vec![result], RetryOutcome::default()))
    }

    fn split_into_batches(&self, ids: Vec<EntityId>) -> Vec<Batch> {
        ids.chunks(self.batch_size)
            .enumerate()
            .map(|(index, chunk)| {
                Batch::new(format!("{BATCH_NAME_PREFIX}{}", index + 1), chunk.to_vec())
            })
            .collect()
    }

    fn params_for(&self, resource: &ResourceSpec, window: Option<&DateWindow>) -> ExtractionParams {
        ExtractionParams {
            resource: resource.name.clone(),
            page_limit: self.page_limit,
            workers: self.pool.capacity(),
            batch_size: self.batch_size,
            window: window.copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::extraction::testkit::{id_records, ScriptedGateway};

    fn create_test_service(gateway: Arc<ScriptedGateway>) -> ExtractionService {
        ExtractionService::new(gateway, WorkerPool::with_defaults())
    }

    #[tokio::test(start_paused = true)]
    async fn test_paged_run_accounts_every_discovered_id() {
        let gateway = ScriptedGateway::new();
        gateway.push_page(id_records(1..=100));
        gateway.push_page(id_records(101..=200));
        gateway.push_page(id_records(201..=240));
        // Id 5 fails once and recovers on retry; id 150 never succeeds.
        gateway.fail_detail("5", 1);
        gateway.fail_detail("150", 10);

        let service = create_test_service(gateway.clone());
        let resource = ResourceSpec::paged("contacts", "contacts");
        let report = service.extract(&resource, None).await.unwrap();

        assert_eq!(report.total_accounted(), 240);
        assert_eq!(report.metadata.successful_extractions, 239);
        assert_eq!(report.metadata.failed_extractions, 1);
        assert_eq!(report.metadata.batches_processed, 3);
        assert_eq!(report.records.len(), 239);

        let batch_1 = &report.processing_summary["batch_1"];
        assert_eq!(batch_1.successful_count, 100);
        assert!(batch_1.failed_ids.is_empty());

        let batch_2 = &report.processing_summary["batch_2"];
        assert_eq!(batch_2.successful_count, 99);
        assert_eq!(batch_2.failed_ids, vec![EntityId::from(150)]);

        let batch_3 = &report.processing_summary["batch_3"];
        assert_eq!(batch_3.successful_count, 40);
    }

    #[tokio::test]
    async fn test_batches_are_split_and_named_in_order() {
        let gateway = ScriptedGateway::new();
        gateway.push_page(id_records(1..=7));

        let service = create_test_service(gateway).with_batch_size(3);
        let resource = ResourceSpec::paged("contacts", "contacts");
        let report = service.extract(&resource, None).await.unwrap();

        let names: Vec<&String> = report.processing_summary.keys().collect();
        assert_eq!(names, vec!["batch_1", "batch_2", "batch_3"]);
        assert_eq!(report.processing_summary["batch_1"].successful_count, 3);
        assert_eq!(report.processing_summary["batch_3"].successful_count, 1);
    }

    #[tokio::test]
    async fn test_windowed_resource_requires_window() {
        let gateway = ScriptedGateway::new();
        let service = create_test_service(gateway);
        let resource = ResourceSpec::windowed("orders", "orders");

        let error = service.extract(&resource, None).await.unwrap_err();

        assert!(matches!(error, ExtractionError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_windowed_run_passes_window_to_every_listing_call() {
        let gateway = ScriptedGateway::new();
        gateway.push_page(id_records(1..=100));
        gateway.push_page(id_records(101..=110));
        let window = DateWindow::parse("2024-03-01", "2024-03-07").unwrap();

        let service = create_test_service(gateway.clone());
        let resource = ResourceSpec::windowed("orders", "orders");
        let report = service.extract(&resource, Some(&window)).await.unwrap();

        assert_eq!(report.metadata.successful_extractions, 110);
        assert_eq!(report.metadata.extraction_params.window, Some(window));
        let windows = gateway.list_windows();
        assert_eq!(windows.len(), 2);
        assert!(windows.iter().all(|w| *w == Some(window)));
    }

    #[tokio::test]
    async fn test_singleton_fetches_collection_in_one_call() {
        let gateway = ScriptedGateway::new();
        gateway.set_collection(vec![
            json!({ "id": 1, "kind": "category" }),
            json!({ "id": 2, "kind": "category" }),
            json!({ "id": 3, "kind": "category" }),
        ]);

        let service = create_test_service(gateway.clone());
        let resource = ResourceSpec::singleton("categories", "categories");
        let report = service.extract(&resource, None).await.unwrap();

        assert_eq!(report.metadata.successful_extractions, 3);
        assert_eq!(report.metadata.batches_processed, 1);
        assert_eq!(report.processing_summary["batch_1"].successful_count, 3);
        assert_eq!(gateway.list_calls(), 0);
        assert_eq!(gateway.detail_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_panic_fails_the_batch_but_not_the_run() {
        let gateway = ScriptedGateway::new();
        gateway.push_page(id_records(1..=10));
        gateway.panic_once_on_detail("3");

        let service = create_test_service(gateway).with_batch_size(5);
        let resource = ResourceSpec::paged("contacts", "contacts");
        let report = service.extract(&resource, None).await.unwrap();

        // The first batch dies wholesale, then every one of its ids recovers
        // in the retry phase.
        assert_eq!(report.total_accounted(), 10);
        assert_eq!(report.metadata.successful_extractions, 10);
        assert_eq!(report.metadata.failed_extractions, 0);
        assert_eq!(report.processing_summary["batch_1"].successful_count, 5);
    }

    #[tokio::test]
    async fn test_discovery_failure_aborts_before_any_detail_fetch() {
        let gateway = ScriptedGateway::new();
        gateway.push_page(id_records(1..=100));
        gateway.push_page_failure(ExtractionError::Transport("listing broke".into()));

        let service = create_test_service(gateway.clone());
        let resource = ResourceSpec::paged("contacts", "contacts");
        let error = service.extract(&resource, None).await.unwrap_err();

        assert!(matches!(error, ExtractionError::Discovery(_)));
        assert_eq!(gateway.detail_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_discovery_produces_empty_report() {
        let gateway = ScriptedGateway::new();

        let service = create_test_service(gateway);
        let resource = ResourceSpec::paged("contacts", "contacts");
        let report = service.extract(&resource, None).await.unwrap();

        assert_eq!(report.total_accounted(), 0);
        assert_eq!(report.metadata.batches_processed, 0);
        assert!(report.records.is_empty());
    }
}
