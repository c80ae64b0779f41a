//! Common data types used throughout the extraction engine

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ExtractionError;

/// Stable identifier of an entity exposed by the upstream API.
///
/// Listing payloads carry ids as JSON numbers or strings; both are kept as
/// their canonical string form so comparisons survive a round trip through
/// reports and retry queues.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Extract the id from a raw listing record, if present.
    pub fn from_record(record: &Value) -> Option<Self> {
        match record.get("id")? {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// A named group of entity ids processed as one unit of work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub name: String,
    pub ids: Vec<EntityId>,
}

impl Batch {
    pub fn new(name: impl Into<String>, ids: Vec<EntityId>) -> Self {
        Self { name: name.into(), ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Outcome of fetching one batch: raw payloads plus the ids that failed.
///
/// Invariant: `records.len() + failed_ids.len()` equals the size of the
/// batch that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub name: String,
    pub records: Vec<Value>,
    pub failed_ids: Vec<EntityId>,
}

impl BatchResult {
    /// A result in which every id of the batch is marked failed.
    ///
    /// Used when the whole batch is lost at once (worker panic).
    pub fn all_failed(batch: &Batch) -> Self {
        Self { name: batch.name.clone(), records: Vec::new(), failed_ids: batch.ids.clone() }
    }

    pub fn success_count(&self) -> usize {
        self.records.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed_ids.len()
    }

    pub fn total(&self) -> usize {
        self.records.len() + self.failed_ids.len()
    }
}

/// Outcome of the sequential recovery pass over failed ids.
///
/// Invariant: `recovered.len() + permanent.len()` equals the number of ids
/// handed to the coordinator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryOutcome {
    pub recovered: Vec<Value>,
    pub permanent: Vec<EntityId>,
}

impl RetryOutcome {
    pub fn total(&self) -> usize {
        self.recovered.len() + self.permanent.len()
    }
}

/// Inclusive date window for windowed resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Build a window from `YYYY-MM-DD` strings, rejecting malformed or
    /// inverted ranges.
    pub fn parse(start: &str, end: &str) -> Result<Self, ExtractionError> {
        let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").map_err(|e| {
            ExtractionError::InvalidInput(format!("invalid start date '{start}': {e}"))
        })?;
        let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
            .map_err(|e| ExtractionError::InvalidInput(format!("invalid end date '{end}': {e}")))?;
        if start > end {
            return Err(ExtractionError::InvalidInput(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Trailing window ending yesterday (UTC), `days` days long.
    ///
    /// Ends on the last complete day. Today's records are still arriving,
    /// so a scheduled run would extract a partial day and never revisit it.
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now().date_naive() - Duration::days(1);
        let start = end - Duration::days(days.max(1) - 1);
        Self { start, end }
    }

    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// How a resource is extracted from the upstream API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Listing pages of ids followed by one detail fetch per id
    Paged,
    /// Paged, with a mandatory date window on the listing call
    Windowed,
    /// Whole collection returned by a single request
    Singleton,
}

/// One extractable resource exposed by the upstream API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Short name used in logs, batch names, and artifact paths
    pub name: String,
    /// URL path below the API base, without leading slash
    pub path: String,
    pub kind: ResourceKind,
}

impl ResourceSpec {
    pub fn paged(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self { name: name.into(), path: path.into(), kind: ResourceKind::Paged }
    }

    pub fn windowed(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self { name: name.into(), path: path.into(), kind: ResourceKind::Windowed }
    }

    pub fn singleton(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self { name: name.into(), path: path.into(), kind: ResourceKind::Singleton }
    }
}

/// Serialized output format for extraction reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One pretty-printed JSON document per run
    Json,
    /// Metadata record, then one JSON line per extracted record
    Ndjson,
}

/// Parameters a run was started with, echoed into the report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionParams {
    pub resource: String,
    pub page_limit: u32,
    pub workers: usize,
    pub batch_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<DateWindow>,
}

/// Report metadata: when the run happened, with what parameters, and the
/// top-level accounting totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub extraction_timestamp: DateTime<Utc>,
    pub extraction_params: ExtractionParams,
    pub successful_extractions: usize,
    pub failed_extractions: usize,
    pub batches_processed: usize,
    pub total_records: usize,
}

/// Per-batch accounting kept alongside the merged records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub successful_count: usize,
    pub failed_count: usize,
    pub failed_ids: Vec<EntityId>,
}

/// Consolidated outcome of one resource extraction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub metadata: ReportMetadata,
    pub records: Vec<Value>,
    pub processing_summary: BTreeMap<String, BatchSummary>,
}

impl ExtractionReport {
    /// Every id the run discovered, successful or permanently failed.
    pub fn total_accounted(&self) -> usize {
        self.metadata.successful_extractions + self.metadata.failed_extractions
    }

    /// Ids that remained failed after the recovery pass.
    pub fn permanent_failures(&self) -> impl Iterator<Item = &EntityId> {
        self.processing_summary.values().flat_map(|s| s.failed_ids.iter())
    }
}
