//! Where finished exports go. One platform class asks the user for a destination
//! directory first; the other writes to an app-private location and then hands the file to
//! a share action. Nothing outside [`select_sink`] branches on the platform.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::error::StorageError;
use crate::export::ExportArtifact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformClass {
    DirectoryGrant,
    PrivateShare,
}

impl PlatformClass {
    pub fn detect() -> Self {
        if cfg!(any(target_os = "ios", target_os = "macos")) {
            PlatformClass::PrivateShare
        } else {
            PlatformClass::DirectoryGrant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformClass::DirectoryGrant => "directory_grant",
            PlatformClass::PrivateShare => "private_share",
        }
    }
}

impl Default for PlatformClass {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Display for PlatformClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PlatformClass {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "directory_grant" | "directory" => Ok(PlatformClass::DirectoryGrant),
            "private_share" | "share" => Ok(PlatformClass::PrivateShare),
            other => Err(format!("unknown platform class '{other}'")),
        }
    }
}

/// How an export reached the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    SavedToDirectory(PathBuf),
    Shared(PathBuf),
    /// No share mechanism was available; the file stays in the private location.
    SavedPrivately(PathBuf),
}

impl Delivery {
    pub fn path(&self) -> &Path {
        match self {
            Delivery::SavedToDirectory(path)
            | Delivery::Shared(path)
            | Delivery::SavedPrivately(path) => path,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Delivery::SavedToDirectory(path) => {
                format!("File saved to the selected directory ({}).", path.display())
            }
            Delivery::Shared(path) => format!("Shared {}.", path.display()),
            Delivery::SavedPrivately(path) => format!("File saved to {}", path.display()),
        }
    }
}

#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn deliver(&self, artifact: &ExportArtifact) -> Result<Delivery, StorageError>;
}

/// Asks the user for a destination directory; `None` means the request was refused.
#[async_trait]
pub trait DirectoryGrant: Send + Sync {
    async fn request_directory(&self) -> Option<PathBuf>;
}

#[async_trait]
pub trait ShareAction: Send + Sync {
    async fn share(&self, path: &Path, mime_type: &str) -> Result<(), StorageError>;
}

/// A grant decided up front (for example from configuration or a command-line flag).
#[derive(Debug, Clone, Default)]
pub struct PresetDirectory(Option<PathBuf>);

impl PresetDirectory {
    pub fn new(directory: Option<PathBuf>) -> Self {
        Self(directory)
    }
}

#[async_trait]
impl DirectoryGrant for PresetDirectory {
    async fn request_directory(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

pub struct DirectoryGrantSink<G> {
    grant: G,
}

impl<G: DirectoryGrant> DirectoryGrantSink<G> {
    pub fn new(grant: G) -> Self {
        Self { grant }
    }
}

#[async_trait]
impl<G: DirectoryGrant> ExportSink for DirectoryGrantSink<G> {
    async fn deliver(&self, artifact: &ExportArtifact) -> Result<Delivery, StorageError> {
        let Some(directory) = self.grant.request_directory().await else {
            return Err(StorageError::PermissionDenied {
                file_name: artifact.file_name.clone(),
            });
        };
        let path = write_artifact(&directory, artifact).await?;
        Ok(Delivery::SavedToDirectory(path))
    }
}

pub struct PrivateShareSink {
    directory: PathBuf,
    share: Option<Arc<dyn ShareAction>>,
}

impl PrivateShareSink {
    pub fn new(directory: impl Into<PathBuf>, share: Option<Arc<dyn ShareAction>>) -> Self {
        Self {
            directory: directory.into(),
            share,
        }
    }
}

#[async_trait]
impl ExportSink for PrivateShareSink {
    async fn deliver(&self, artifact: &ExportArtifact) -> Result<Delivery, StorageError> {
        let path = write_artifact(&self.directory, artifact).await?;
        match &self.share {
            Some(share) => {
                share.share(&path, artifact.mime_type).await?;
                Ok(Delivery::Shared(path))
            }
            None => Ok(Delivery::SavedPrivately(path)),
        }
    }
}

/// Shares by running an external program with the file path appended, e.g. `xdg-open`.
#[derive(Debug, Clone)]
pub struct CommandShare {
    program: String,
    args: Vec<String>,
}

impl CommandShare {
    /// Splits `command` on whitespace; `None` when it is blank.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait]
impl ShareAction for CommandShare {
    async fn share(&self, path: &Path, mime_type: &str) -> Result<(), StorageError> {
        debug!(program = %self.program, path = %path.display(), mime_type, "invoking share command");
        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()
            .await
            .map_err(|err| StorageError::Share {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(StorageError::Share {
                path: path.to_path_buf(),
                message: format!("{} exited with {status}", self.program),
            })
        }
    }
}

async fn write_artifact(directory: &Path, artifact: &ExportArtifact) -> Result<PathBuf, StorageError> {
    tokio::fs::create_dir_all(directory)
        .await
        .map_err(|source| StorageError::Write {
            path: directory.to_path_buf(),
            source,
        })?;
    let path = directory.join(&artifact.file_name);
    tokio::fs::write(&path, &artifact.bytes)
        .await
        .map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;
    debug!(path = %path.display(), bytes = artifact.bytes.len(), "wrote export artifact");
    Ok(path)
}

/// Picks the sink for the configured platform class.
pub fn select_sink(settings: &Settings) -> Arc<dyn ExportSink> {
    match settings.platform {
        PlatformClass::DirectoryGrant => Arc::new(DirectoryGrantSink::new(PresetDirectory::new(
            settings.export_dir.clone(),
        ))),
        PlatformClass::PrivateShare => {
            let share = settings
                .share_command
                .as_deref()
                .and_then(CommandShare::parse)
                .map(|command| Arc::new(command) as Arc<dyn ShareAction>);
            Arc::new(PrivateShareSink::new(settings.private_dir.clone(), share))
        }
    }
}
