// crates/sensorgraph-core/src/error.rs

use std::path::PathBuf;

use sensorgraph_parser::{ChannelKey, NormalizeError};
use thiserror::Error;

/// Anything that prevents a fetch from producing a new generation. Always recovered by
/// resetting the dashboard to an empty generation.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("response body was not valid JSON: {0}")]
    Decode(String),

    #[error("failed to read readings from {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("no average available for channel {channel}; refresh before exporting")]
    MissingAverage { channel: ChannelKey },

    #[error("chart {index} does not exist (generation has {available} charts)")]
    UnknownChart { index: usize, available: usize },

    #[error("spreadsheet encoding failed: {0}")]
    Spreadsheet(String),

    #[error("document encoding failed: {0}")]
    Document(String),

    #[error("chart rendering failed: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Spreadsheet(err.to_string())
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Spreadsheet(err.to_string())
    }
}

impl From<printpdf::Error> for ExportError {
    fn from(err: printpdf::Error) -> Self {
        ExportError::Document(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage permission is required to save {file_name}")]
    PermissionDenied { file_name: String },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("share action failed for {path}: {message}")]
    Share { path: PathBuf, message: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown timezone '{0}'")]
    Timezone(String),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}
