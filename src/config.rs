//! Configuration types for bulk-dl

use crate::error::{Error, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder replaced with the run timestamp in file names
pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

/// chrono format used to expand [`TIMESTAMP_PLACEHOLDER`]
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Log file location
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory holding log files (default: "./.script-logs")
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,

    /// Log file name inside `log_directory`, opened in append mode
    /// (default: "script_log-{timestamp}.log")
    #[serde(default = "default_log_file_name")]
    pub log_file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_directory: default_log_directory(),
            log_file_name: default_log_file_name(),
        }
    }
}

impl LoggingConfig {
    /// Full path of the log file
    pub fn log_file_path(&self) -> PathBuf {
        self.log_directory.join(&self.log_file_name)
    }
}

/// Login request parameters
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LoginConfig {
    /// Base URL of the remote service (e.g. "http://httpbin.org/")
    pub base_url: String,

    /// Path appended verbatim to `base_url` for the login POST
    #[serde(default)]
    pub login_path: String,

    /// Form fields sent with the login POST
    #[serde(default, alias = "login_headers")]
    pub login_form_data: BTreeMap<String, String>,
}

impl LoginConfig {
    /// The login URL, `base_url` and `login_path` concatenated as configured
    pub fn login_url(&self) -> String {
        format!("{}{}", self.base_url, self.login_path)
    }
}

/// Download behavior settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory receiving every downloaded file (default: "./.download_archive")
    #[serde(default = "default_download_archive_directory")]
    pub download_archive_directory: PathBuf,

    /// Optional per-request timeout in seconds (None = transport default, no timeout)
    #[serde(
        default,
        rename = "request_timeout_secs",
        with = "optional_duration_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_timeout: Option<Duration>,

    /// Remove a partially written file when a download fails mid-stream (default: false)
    #[serde(default)]
    pub remove_partial_downloads: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_archive_directory: default_download_archive_directory(),
            request_timeout: None,
            remove_partial_downloads: false,
        }
    }
}

/// One concrete attempt specification for a task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Full download URL
    #[serde(alias = "URL")]
    pub url: String,

    /// HTTP method, "get" or "post" in any case; validated when the candidate is attempted
    pub method: String,

    /// Form fields for POST, query parameters for GET
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// File name inside the download archive directory
    pub filename: String,

    /// Extract `zip_member_to_extract` from the downloaded file
    #[serde(default)]
    pub extract_zip: bool,

    /// Archive member to extract (required when `extract_zip` is set)
    #[serde(default)]
    pub zip_member_to_extract: Option<String>,

    /// Where the extracted member is copied (required when `extract_zip` is set)
    #[serde(default)]
    pub zip_member_final_destination: Option<PathBuf>,
}

/// A named download goal and its candidates in fallback order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    /// Unique task name
    pub name: String,
    /// Candidates, tried in this order
    pub candidates: Vec<Candidate>,
}

/// Ordered task list, serialized as a JSON object in declaration order
///
/// Each value is either a single candidate object or a list of candidates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadActions(pub Vec<Task>);

impl DownloadActions {
    /// Iterate tasks in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.0.iter()
    }

    /// Number of tasks
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no task is configured
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a DownloadActions {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for DownloadActions {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.0.iter().map(|task| (&task.name, &task.candidates)))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Candidate>),
    One(Box<Candidate>),
}

impl From<OneOrMany> for Vec<Candidate> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::Many(list) => list,
            OneOrMany::One(single) => vec![*single],
        }
    }
}

struct DownloadActionsVisitor;

impl<'de> Visitor<'de> for DownloadActionsVisitor {
    type Value = DownloadActions;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of download name to a candidate or a list of candidates")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut tasks: Vec<Task> = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((name, value)) = map.next_entry::<String, OneOrMany>()? {
            if tasks.iter().any(|t| t.name == name) {
                return Err(de::Error::custom(format!(
                    "duplicate download action \"{}\"",
                    name
                )));
            }
            tasks.push(Task {
                name,
                candidates: value.into(),
            });
        }
        Ok(DownloadActions(tasks))
    }
}

impl<'de> Deserialize<'de> for DownloadActions {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(DownloadActionsVisitor)
    }
}

/// Main configuration for BulkDownloader
///
/// Sub-configs are flattened, so the JSON file is a single flat object:
///
/// ```json
/// {
///   "log_directory": "./.script-logs",
///   "log_file_name": "script_log-{timestamp}.log",
///   "download_archive_directory": "./.download_archive",
///   "base_url": "http://httpbin.org/",
///   "login_path": "post",
///   "login_form_data": { "custname": "test_username" },
///   "download_actions": {
///     "png": {
///       "url": "http://httpbin.org/image/png",
///       "method": "get",
///       "filename": "image-{timestamp}.png"
///     }
///   }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Log file location
    #[serde(flatten)]
    pub logging: LoggingConfig,

    /// Login request parameters
    #[serde(flatten)]
    pub login: LoginConfig,

    /// Download behavior settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// Tasks in declaration order
    #[serde(default)]
    pub download_actions: DownloadActions,
}

impl Config {
    /// Read, parse and validate a JSON configuration file
    ///
    /// `{timestamp}` placeholders are expanded with the current local time.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self::from_json(&content, &timestamp)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str, timestamp: &str) -> Result<Self> {
        let mut config: Config = serde_json::from_str(json)?;
        config.validate()?;
        config.expand_timestamp(timestamp);
        Ok(config)
    }

    /// Check settings that would otherwise only fail once the run has started
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.login.base_url).map_err(|e| {
            Error::config(
                format!("base_url {:?} is not a valid URL: {}", self.login.base_url, e),
                "base_url",
            )
        })?;
        if self.logging.log_file_name.trim().is_empty() {
            return Err(Error::config("log_file_name must not be empty", "log_file_name"));
        }
        Ok(())
    }

    /// Replace `{timestamp}` in the log file name and every candidate filename
    pub fn expand_timestamp(&mut self, timestamp: &str) {
        self.logging.log_file_name = self
            .logging
            .log_file_name
            .replace(TIMESTAMP_PLACEHOLDER, timestamp);
        for task in &mut self.download_actions.0 {
            for candidate in &mut task.candidates {
                candidate.filename = candidate.filename.replace(TIMESTAMP_PLACEHOLDER, timestamp);
            }
        }
    }

    /// Download archive directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.download.download_archive_directory
    }
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("./.script-logs")
}

fn default_log_file_name() -> String {
    format!("script_log-{}.log", TIMESTAMP_PLACEHOLDER)
}

fn default_download_archive_directory() -> PathBuf {
    PathBuf::from("./.download_archive")
}

// Optional Duration serialization helper (whole seconds)
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
