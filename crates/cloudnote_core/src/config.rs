//! Core configuration for the image host and document store clients.
//!
//! # Responsibility
//! - Deserialize client settings from the JSON document handed over by the
//!   app shell (or a file during local development).
//! - Reject unusable settings before any client is built.
//!
//! # Invariants
//! - Credentials are static client identifiers, not per-user secrets.
//! - Every field except the credentials has a working default.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub const DEFAULT_IMAGE_ENDPOINT: &str = "https://api.imgur.com/3/image";
pub const DEFAULT_STORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_DATABASE: &str = "(default)";
pub const DEFAULT_COLLECTION: &str = "notes";

const DEFAULT_UPLOAD_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_PAGE_SIZE: u32 = 300;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
    /// HTTP client construction failed (TLS backend, etc.).
    Client(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
            Self::Client(message) => write!(f, "failed to build http client: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) | Self::Client(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Top-level settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudNoteConfig {
    pub image_host: ImageHostConfig,
    pub document_store: DocumentStoreConfig,
}

impl CloudNoteConfig {
    /// Parses and validates a JSON settings document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.image_host.validate()?;
        self.document_store.validate()
    }
}

/// Image host settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHostConfig {
    #[serde(default = "default_image_endpoint")]
    pub endpoint: String,
    /// Application client id sent as `Client-ID`.
    pub client_id: String,
    #[serde(default = "default_upload_timeout_ms")]
    pub timeout_ms: u64,
}

impl ImageHostConfig {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            endpoint: default_image_endpoint(),
            client_id: client_id.into(),
            timeout_ms: DEFAULT_UPLOAD_TIMEOUT_MS,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_blank("image_host.endpoint", &self.endpoint)?;
        require_non_blank("image_host.client_id", &self.client_id)?;
        require_positive("image_host.timeout_ms", self.timeout_ms)
    }
}

/// Document store (Firestore REST) settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStoreConfig {
    #[serde(default = "default_store_base_url")]
    pub base_url: String,
    pub project_id: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Web API key appended as `key=` when set.
    #[serde(default)]
    pub api_key: Option<String>,
    /// ID token of the signed-in user, sent as a bearer token when set.
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,
}

impl DocumentStoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: default_store_base_url(),
            project_id: project_id.into(),
            database: default_database(),
            collection: default_collection(),
            api_key: None,
            id_token: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            page_size: DEFAULT_PAGE_SIZE,
            timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_blank("document_store.base_url", &self.base_url)?;
        require_non_blank("document_store.project_id", &self.project_id)?;
        require_non_blank("document_store.database", &self.database)?;
        require_non_blank("document_store.collection", &self.collection)?;
        if self.collection.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "document_store.collection must be a single path segment, got `{}`",
                self.collection
            )));
        }
        require_positive("document_store.poll_interval_ms", self.poll_interval_ms)?;
        require_positive("document_store.page_size", u64::from(self.page_size))?;
        require_positive("document_store.timeout_ms", self.timeout_ms)
    }
}

fn require_non_blank(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{name} cannot be empty")));
    }
    Ok(())
}

fn require_positive(name: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid(format!("{name} must be greater than 0")));
    }
    Ok(())
}

fn default_image_endpoint() -> String {
    DEFAULT_IMAGE_ENDPOINT.to_string()
}

fn default_upload_timeout_ms() -> u64 {
    DEFAULT_UPLOAD_TIMEOUT_MS
}

fn default_store_base_url() -> String {
    DEFAULT_STORE_BASE_URL.to_string()
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_store_timeout_ms() -> u64 {
    DEFAULT_STORE_TIMEOUT_MS
}
