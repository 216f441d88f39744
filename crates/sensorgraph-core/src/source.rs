use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;

/// Something that produces the raw JSON array of readings, newest first.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    fn describe(&self) -> String;
    async fn fetch(&self) -> Result<Value, FetchError>;
}

/// Read-only HTTP endpoint. Any non-2xx status counts as a failed fetch.
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        Ok(Self { url, client })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReadingSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Value, FetchError> {
        let transport = |source| FetchError::Transport {
            url: self.url.clone(),
            source,
        };

        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        debug!(url = %self.url, bytes = body.len(), "fetched sensor readings");
        serde_json::from_slice(&body).map_err(|err| FetchError::Decode(err.to_string()))
    }
}

/// Reads a saved response body from disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ReadingSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Value, FetchError> {
        let body = tokio::fs::read(&self.path)
            .await
            .map_err(|source| FetchError::File {
                path: self.path.clone(),
                source,
            })?;
        serde_json::from_slice(&body).map_err(|err| FetchError::Decode(err.to_string()))
    }
}
