//! Scripted gateway shared by the pipeline unit tests

#![allow(clippy::missing_errors_doc)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use decant_domain::{DateWindow, EntityId, ExtractionError, ResourceSpec, Result};
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::ports::ExtractionGateway;

/// In-memory gateway with scripted listing pages and per-id detail failures
///
/// Listing pages pop in order; once the script runs dry every further page is
/// empty. Detail calls succeed with a small synthetic payload unless failures
/// were queued for that id, and queued failures pop one per call, so an id
/// with two queued errors recovers on its third attempt.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    pages: Mutex<VecDeque<Result<Vec<Value>>>>,
    detail_failures: Mutex<HashMap<String, VecDeque<ExtractionError>>>,
    panic_ids: Mutex<HashSet<String>>,
    collection: Mutex<Option<Result<Vec<Value>>>>,
    list_calls: AtomicU32,
    detail_calls: AtomicU32,
    detail_times: Mutex<Vec<tokio::time::Instant>>,
    list_windows: Mutex<Vec<Option<DateWindow>>>,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_page(&self, records: Vec<Value>) {
        self.pages.lock().push_back(Ok(records));
    }

    pub fn push_page_failure(&self, error: ExtractionError) {
        self.pages.lock().push_back(Err(error));
    }

    /// Queue `times` transport failures for one id
    pub fn fail_detail(&self, id: &str, times: u32) {
        let mut failures = self.detail_failures.lock();
        let queue = failures.entry(id.to_string()).or_default();
        for _ in 0..times {
            queue.push_back(ExtractionError::Transport(format!(
                "scripted failure for {id}"
            )));
        }
    }

    /// Make the next detail call for one id panic instead of returning
    pub fn panic_once_on_detail(&self, id: &str) {
        self.panic_ids.lock().insert(id.to_string());
    }

    pub fn set_collection(&self, records: Vec<Value>) {
        *self.collection.lock() = Some(Ok(records));
    }

    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> u32 {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn detail_times(&self) -> Vec<tokio::time::Instant> {
        self.detail_times.lock().clone()
    }

    /// The window argument observed on every listing call, in call order
    pub fn list_windows(&self) -> Vec<Option<DateWindow>> {
        self.list_windows.lock().clone()
    }
}

#[async_trait]
impl ExtractionGateway for ScriptedGateway {
    async fn list_page(
        &self,
        _resource: &ResourceSpec,
        _page: u32,
        _limit: u32,
        window: Option<&DateWindow>,
    ) -> Result<Vec<Value>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.list_windows.lock().push(window.copied());
        self.pages.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_detail(&self, resource: &ResourceSpec, id: &EntityId) -> Result<Value> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.detail_times.lock().push(tokio::time::Instant::now());
        if self.panic_ids.lock().remove(id.0.as_str()) {
            panic!("scripted panic for {id}");
        }
        let scripted = self
            .detail_failures
            .lock()
            .get_mut(id.0.as_str())
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(error) => Err(error),
            None => Ok(json!({ "id": id, "resource": resource.name })),
        }
    }

    async fn fetch_collection(&self, _resource: &ResourceSpec) -> Result<Vec<Value>> {
        self.collection
            .lock()
            .take()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Listing records with numeric ids covering `range`
pub(crate) fn id_records(range: std::ops::RangeInclusive<i64>) -> Vec<Value> {
    range.map(|id| json!({ "id": id })).collect()
}
