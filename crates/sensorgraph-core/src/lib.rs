pub mod aggregation;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod series;
pub mod source;
pub mod storage;

pub use aggregation::{compute_averages, AggregateTable, ChannelAverage};
pub use config::Settings;
pub use dashboard::{Dashboard, Generation, RefreshOutcome};
pub use error::{ConfigError, ExportError, FetchError, StorageError};
pub use export::{ExportArtifact, ExportKind, ExportOptions, Exporter, SpreadsheetFormat};
pub use series::{build_series, ChartSeries, SeriesLine, SeriesMetric};
pub use source::{FileSource, HttpSource, ReadingSource};
pub use storage::{Delivery, ExportSink, PlatformClass};
