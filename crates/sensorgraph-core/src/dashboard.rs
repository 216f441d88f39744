use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sensorgraph_parser::{normalize_batch, SensorReading, TimestampPolicy};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::aggregation::{compute_averages, AggregateTable};
use crate::config::Settings;
use crate::error::{ExportError, FetchError};
use crate::export::{ExportKind, ExportOptions, Exporter};
use crate::series::{build_series, ChartSeries};
use crate::source::ReadingSource;
use crate::storage::{Delivery, ExportSink};

/// Everything derived from one fetch. Never mutated after construction; a new fetch
/// replaces the whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub readings: Vec<SensorReading>,
    pub averages: AggregateTable,
    pub series: Vec<ChartSeries>,
    pub rejected: usize,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Generation {
    /// Averages are computed first; the series read them.
    pub fn build(
        readings: Vec<SensorReading>,
        rejected: usize,
        window_size: usize,
        timezone: Tz,
    ) -> Self {
        let averages = compute_averages(&readings);
        let series = build_series(&readings, &averages, window_size, timezone);
        Self {
            readings,
            averages,
            series,
            rejected,
            fetched_at: None,
        }
    }

    /// The state before any successful fetch, and after a failed one.
    pub fn empty() -> Self {
        Self::build(Vec::new(), 0, 0, chrono_tz::UTC)
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Updated { readings: usize, rejected: usize },
    /// The fetch failed and the dashboard was reset to an empty generation.
    Failed(FetchError),
    /// Another refresh was still running; nothing changed.
    AlreadyInFlight,
}

#[derive(Debug, Clone, Copy)]
struct PipelineSettings {
    window_size: usize,
    timezone: Tz,
    timestamp_policy: TimestampPolicy,
}

/// Owns the current generation and serializes fetches.
pub struct Dashboard {
    source: Arc<dyn ReadingSource>,
    exporter: Exporter,
    settings: PipelineSettings,
    current: RwLock<Arc<Generation>>,
    fetch_gate: Mutex<()>,
}

impl Dashboard {
    pub fn new(
        source: Arc<dyn ReadingSource>,
        sink: Arc<dyn ExportSink>,
        settings: &Settings,
    ) -> Self {
        let exporter = Exporter::new(
            sink,
            ExportOptions {
                timezone: settings.timezone,
                first_page_rows: settings.first_page_rows,
            },
        );
        Self {
            source,
            exporter,
            settings: PipelineSettings {
                window_size: settings.window_size,
                timezone: settings.timezone,
                timestamp_policy: settings.timestamp_policy,
            },
            current: RwLock::new(Arc::new(Generation::empty())),
            fetch_gate: Mutex::new(()),
        }
    }

    pub async fn current(&self) -> Arc<Generation> {
        self.current.read().await.clone()
    }

    /// Fetches, normalizes and rebuilds everything, then swaps the new generation in.
    /// A concurrent call while one is running returns [`RefreshOutcome::AlreadyInFlight`].
    pub async fn refresh(&self) -> RefreshOutcome {
        let Ok(_gate) = self.fetch_gate.try_lock() else {
            debug!("refresh requested while another fetch is in flight");
            return RefreshOutcome::AlreadyInFlight;
        };

        match self.load().await {
            Ok(generation) => {
                let readings = generation.readings.len();
                let rejected = generation.rejected;
                *self.current.write().await = Arc::new(generation);
                info!(
                    source = %self.source.describe(),
                    readings,
                    rejected,
                    "dashboard generation replaced"
                );
                RefreshOutcome::Updated { readings, rejected }
            }
            Err(err) => {
                warn!(
                    source = %self.source.describe(),
                    error = %err,
                    "fetch failed; dashboard reset to empty"
                );
                *self.current.write().await = Arc::new(Generation::empty());
                RefreshOutcome::Failed(err)
            }
        }
    }

    async fn load(&self) -> Result<Generation, FetchError> {
        let body = self.source.fetch().await?;
        let batch = normalize_batch(&body, self.settings.timestamp_policy)?;
        let mut generation = Generation::build(
            batch.readings,
            batch.rejected.len(),
            self.settings.window_size,
            self.settings.timezone,
        );
        generation.fetched_at = Some(Utc::now());
        Ok(generation)
    }

    /// Exports from a snapshot of the current generation. Failures leave it untouched.
    pub async fn export(&self, kind: ExportKind) -> Result<Delivery, ExportError> {
        let generation = self.current().await;
        self.exporter.export(kind, &generation).await
    }
}
