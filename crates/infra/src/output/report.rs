//! Report rendering

use std::sync::Arc;

use decant_domain::{ExtractionError, ExtractionReport, OutputFormat, Result};
use serde_json::json;
use tracing::info;

use super::store::ArtifactStore;

/// Renders extraction reports and hands them to the artifact store
pub struct ReportWriter {
    store: Arc<dyn ArtifactStore>,
    format: OutputFormat,
}

impl ReportWriter {
    #[must_use]
    pub fn new(store: Arc<dyn ArtifactStore>, format: OutputFormat) -> Self {
        Self { store, format }
    }

    /// Render `report` and store it under a timestamped per-resource name.
    ///
    /// Returns the artifact name the report was stored under.
    ///
    /// # Errors
    /// Returns `Serialization` if rendering fails, `State` if the store
    /// write fails.
    pub async fn write(&self, report: &ExtractionReport) -> Result<String> {
        let name = self.artifact_name(report);
        let bytes = match self.format {
            OutputFormat::Ndjson => render_ndjson(report)?,
            OutputFormat::Json => render_json(report)?,
        };

        self.store.put(&name, &bytes).await?;
        info!(
            artifact = %name,
            records = report.metadata.total_records,
            "Report written"
        );
        Ok(name)
    }

    fn artifact_name(&self, report: &ExtractionReport) -> String {
        let resource = &report.metadata.extraction_params.resource;
        let stamp = report.metadata.extraction_timestamp.format("%Y%m%d_%H%M%S");
        let extension = match self.format {
            OutputFormat::Ndjson => "ndjson",
            OutputFormat::Json => "json",
        };
        format!("{resource}/{resource}_{stamp}.{extension}")
    }
}

/// One metadata line, then one line per record.
fn render_ndjson(report: &ExtractionReport) -> Result<Vec<u8>> {
    let metadata_line = json!({
        "extraction_timestamp": report.metadata.extraction_timestamp,
        "extraction_params": report.metadata.extraction_params,
        "total_records": report.metadata.total_records,
    });

    let mut out = serde_json::to_vec(&metadata_line)
        .map_err(|e| ExtractionError::Serialization(format!("report metadata: {e}")))?;
    out.push(b'\n');

    for record in &report.records {
        let line = serde_json::to_vec(record)
            .map_err(|e| ExtractionError::Serialization(format!("report record: {e}")))?;
        out.extend_from_slice(&line);
        out.push(b'\n');
    }

    Ok(out)
}

/// The whole report as a single pretty-printed document.
fn render_json(report: &ExtractionReport) -> Result<Vec<u8>> {
    let mut out = serde_json::to_vec_pretty(report)
        .map_err(|e| ExtractionError::Serialization(format!("report: {e}")))?;
    out.push(b'\n');
    Ok(out)
}
