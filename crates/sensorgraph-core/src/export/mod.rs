//! Spreadsheet, document and chart-snapshot exports of the current generation.
//!
//! Rendering is pure and synchronous; only delivery through an [`ExportSink`] suspends.
//! Every export checks the same precondition first: all thirteen channel averages must
//! exist, otherwise [`ExportError::MissingAverage`] is returned and nothing is written.

pub mod document;
pub mod snapshot;
pub mod spreadsheet;
pub mod table;

use std::sync::Arc;

use bytes::Bytes;
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::dashboard::Generation;
use crate::error::ExportError;
use crate::storage::{Delivery, ExportSink};

pub use document::render_document;
pub use snapshot::{render_snapshot, snapshot_id};
pub use spreadsheet::{render_spreadsheet, SpreadsheetFormat};
pub use table::{paginate, AverageRow, Cell, ExportRow, ExportTable, TablePage, TableRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Spreadsheet(SpreadsheetFormat),
    Document,
    /// Chart snapshot by position in the generation's series list.
    Snapshot { chart: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub timezone: Tz,
    pub first_page_rows: usize,
}

/// Renders `kind` from `generation` without touching any storage.
pub fn render(
    kind: ExportKind,
    generation: &Generation,
    options: ExportOptions,
) -> Result<ExportArtifact, ExportError> {
    match kind {
        ExportKind::Spreadsheet(format) => {
            let table =
                ExportTable::build(&generation.readings, &generation.averages, options.timezone)?;
            render_spreadsheet(&table, format)
        }
        ExportKind::Document => {
            let table =
                ExportTable::build(&generation.readings, &generation.averages, options.timezone)?;
            render_document(&table, options.first_page_rows)
        }
        ExportKind::Snapshot { chart } => {
            AverageRow::from_table(&generation.averages)?;
            let series = generation
                .series
                .get(chart)
                .ok_or(ExportError::UnknownChart {
                    index: chart,
                    available: generation.series.len(),
                })?;
            render_snapshot(series, &snapshot_id(chart))
        }
    }
}

/// Renders exports and hands them to the platform sink.
#[derive(Clone)]
pub struct Exporter {
    sink: Arc<dyn ExportSink>,
    options: ExportOptions,
}

impl Exporter {
    pub fn new(sink: Arc<dyn ExportSink>, options: ExportOptions) -> Self {
        Self { sink, options }
    }

    pub fn options(&self) -> ExportOptions {
        self.options
    }

    pub async fn export(
        &self,
        kind: ExportKind,
        generation: &Generation,
    ) -> Result<Delivery, ExportError> {
        let artifact = render(kind, generation, self.options).inspect_err(|err| {
            warn!(?kind, error = %err, "export rendering failed");
        })?;

        let delivery = self.sink.deliver(&artifact).await.inspect_err(|err| {
            warn!(file = %artifact.file_name, error = %err, "export delivery failed");
        })?;

        info!(
            file = %artifact.file_name,
            bytes = artifact.bytes.len(),
            delivery = ?delivery,
            "export delivered"
        );
        Ok(delivery)
    }
}
