//! Final report assembly
//!
//! Folds the per-batch results and the retry outcome into one tagged report.
//! Accounting invariant: every discovered id shows up exactly once, either
//! inside `successful_extractions` or inside `failed_extractions`, and the
//! per-batch summaries agree with the top-level totals.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use decant_domain::{
    BatchResult, BatchSummary, EntityId, ExtractionParams, ExtractionReport, ReportMetadata,
    RetryOutcome,
};
use tracing::info;

/// Merge batch results and the retry outcome into the final report
///
/// Ids recovered by the retry pass are credited back to the batch that
/// originally failed them, so a batch's `failed_ids` ends up holding only
/// permanent failures. Recovered payloads are appended after the batch
/// records.
pub fn consolidate(
    params: ExtractionParams,
    batch_results: Vec<BatchResult>,
    retry: RetryOutcome,
) -> ExtractionReport {
    let RetryOutcome { recovered, permanent } = retry;
    let permanent_set: HashSet<&EntityId> = permanent.iter().collect();

    let batches_processed = batch_results.len();
    let mut records = Vec::new();
    let mut processing_summary = BTreeMap::new();
    let mut successful = 0usize;

    for batch in batch_results {
        let BatchResult { name, records: batch_records, failed_ids } = batch;
        let (still_failed, recovered_here): (Vec<EntityId>, Vec<EntityId>) =
            failed_ids.into_iter().partition(|id| permanent_set.contains(id));

        let successful_count = batch_records.len() + recovered_here.len();
        successful += successful_count;
        records.extend(batch_records);

        processing_summary.insert(
            name,
            BatchSummary {
                successful_count,
                failed_count: still_failed.len(),
                failed_ids: still_failed,
            },
        );
    }

    records.extend(recovered);

    info!(
        successful,
        failed = permanent.len(),
        batches = batches_processed,
        records = records.len(),
        "Consolidated extraction report"
    );

    ExtractionReport {
        metadata: ReportMetadata {
            extraction_timestamp: Utc::now(),
            extraction_params: params,
            successful_extractions: successful,
            failed_extractions: permanent.len(),
            batches_processed,
            total_records: records.len(),
        },
        records,
        processing_summary,
    }
}
