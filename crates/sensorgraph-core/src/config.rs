use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use sensorgraph_parser::TimestampPolicy;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::storage::PlatformClass;

pub const DEFAULT_ENDPOINT: &str = "https://transmonk-aaf.onrender.com/api/v1/sensor-data";
pub const DEFAULT_WINDOW_SIZE: usize = 50;
pub const DEFAULT_FIRST_PAGE_ROWS: usize = 12;
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Kolkata;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const ENV_PREFIX: &str = "SENSORGRAPH_";

/// Runtime settings. Compiled-in defaults, then an optional TOML file, then
/// `SENSORGRAPH_*` environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: String,
    pub window_size: usize,
    pub timezone: Tz,
    pub first_page_rows: usize,
    pub timestamp_policy: TimestampPolicy,
    pub platform: PlatformClass,
    /// Directory the user has granted for [`PlatformClass::DirectoryGrant`] exports.
    pub export_dir: Option<PathBuf>,
    /// App-private directory for [`PlatformClass::PrivateShare`] exports.
    pub private_dir: PathBuf,
    pub share_command: Option<String>,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            window_size: DEFAULT_WINDOW_SIZE,
            timezone: DEFAULT_TIMEZONE,
            first_page_rows: DEFAULT_FIRST_PAGE_ROWS,
            timestamp_policy: TimestampPolicy::default(),
            platform: PlatformClass::default(),
            export_dir: None,
            private_dir: std::env::temp_dir().join("sensorgraph"),
            share_command: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    endpoint: Option<String>,
    window_size: Option<usize>,
    timezone: Option<String>,
    first_page_rows: Option<usize>,
    timestamp_policy: Option<TimestampPolicy>,
    platform: Option<PlatformClass>,
    export_dir: Option<PathBuf>,
    private_dir: Option<PathBuf>,
    share_command: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl Settings {
    /// Defaults, overlaid with `path` (if any) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: SettingsFile = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;

        let mut settings = Self::default();
        if let Some(endpoint) = file.endpoint {
            settings.endpoint = endpoint;
        }
        if let Some(window_size) = file.window_size {
            settings.window_size = window_size;
        }
        if let Some(timezone) = file.timezone {
            settings.timezone = parse_timezone(&timezone)?;
        }
        if let Some(rows) = file.first_page_rows {
            settings.first_page_rows = rows;
        }
        if let Some(policy) = file.timestamp_policy {
            settings.timestamp_policy = policy;
        }
        if let Some(platform) = file.platform {
            settings.platform = platform;
        }
        if file.export_dir.is_some() {
            settings.export_dir = file.export_dir;
        }
        if let Some(private_dir) = file.private_dir {
            settings.private_dir = private_dir;
        }
        if file.share_command.is_some() {
            settings.share_command = file.share_command;
        }
        if let Some(secs) = file.request_timeout_secs {
            settings.request_timeout = Duration::from_secs(secs);
        }
        Ok(settings)
    }

    /// Applies `SENSORGRAPH_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(endpoint) = var("ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(value) = var("WINDOW_SIZE") {
            self.window_size = parse_number("SENSORGRAPH_WINDOW_SIZE", &value)?;
        }
        if let Some(value) = var("TIMEZONE") {
            self.timezone = parse_timezone(&value)?;
        }
        if let Some(value) = var("FIRST_PAGE_ROWS") {
            self.first_page_rows = parse_number("SENSORGRAPH_FIRST_PAGE_ROWS", &value)?;
        }
        if let Some(value) = var("TIMESTAMP_POLICY") {
            self.timestamp_policy = match value.as_str() {
                "keep_for_aggregation" => TimestampPolicy::KeepForAggregation,
                "drop_reading" => TimestampPolicy::DropReading,
                other => {
                    return Err(ConfigError::Invalid {
                        key: "SENSORGRAPH_TIMESTAMP_POLICY",
                        message: format!("expected keep_for_aggregation or drop_reading, got '{other}'"),
                    })
                }
            };
        }
        if let Some(value) = var("PLATFORM") {
            self.platform = PlatformClass::try_from(value.as_str()).map_err(|message| {
                ConfigError::Invalid {
                    key: "SENSORGRAPH_PLATFORM",
                    message,
                }
            })?;
        }
        if let Some(value) = var("EXPORT_DIR") {
            self.export_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = var("PRIVATE_DIR") {
            self.private_dir = PathBuf::from(value);
        }
        if let Some(value) = var("SHARE_COMMAND") {
            self.share_command = Some(value);
        }
        if let Some(value) = var("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_number("SENSORGRAPH_REQUEST_TIMEOUT_SECS", &value)?;
            self.request_timeout = Duration::from_secs(secs);
        }
        Ok(())
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::Timezone(name.to_string()))
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
        key,
        message: err.to_string(),
    })
}
